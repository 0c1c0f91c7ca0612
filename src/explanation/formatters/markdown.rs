use crate::explanation::nitrogen::check_soil_nitrogen_excess;
use crate::explanation::types::WarningCard;
use crate::recommend::Recommendation;

/// Markdown formatter for chat replies
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format a recommendation as markdown
    pub fn format(rec: &Recommendation) -> String {
        let mut md = String::with_capacity(1024);

        md.push_str(&format!(
            "### 🌾 Analysis for {} in {}\n\n",
            rec.crop,
            rec.location()
        ));

        md.push_str(&format!(
            "**1. Crop Requirement:** {} needs {} kg/ha of Nitrogen (approx **{:.1} kg/ha**).  \n",
            rec.crop, rec.required_range, rec.required_n_midpoint
        ));
        md.push_str(&format!(
            "**2. Soil Status:** Your soil already has **{:.1} kg/ha** of Nitrogen.  \n",
            rec.soil_n
        ));
        md.push_str(&format!(
            "**3. Excess Nitrogen:** You have an excess of **{:.1} kg/ha**.\n\n",
            rec.excess_n
        ));

        md.push_str("#### 📉 Recommendation:\n\n");
        if rec.has_excess() {
            md.push_str(&format!(
                "You can potentially reduce Urea application by **{:.2} kg/ha** while still meeting the crop's needs.\n",
                rec.recommended_urea_kg_ha
            ));
            if let (Some(full), Some(adjusted)) = (rec.full_urea_dose, rec.adjusted_urea_dose) {
                md.push_str(&format!(
                    "Reference dose: {:.2} kg/ha → adjusted dose: **{:.2} kg/ha**.\n",
                    full, adjusted
                ));
            }
        } else {
            md.push_str("Soil nitrogen does not exceed the requirement, so no Urea reduction is possible. ");
            match rec.full_urea_dose {
                Some(full) => md.push_str(&format!(
                    "Apply the full recommended dose of **{:.2} kg/ha** Urea.\n",
                    full
                )),
                None => md.push_str("Apply the full recommended dose.\n"),
            }
        }

        if let Some(warning) = check_soil_nitrogen_excess(rec) {
            md.push('\n');
            Self::format_warning(&mut md, &warning);
        }

        md
    }

    fn format_warning(md: &mut String, warning: &WarningCard) {
        md.push_str(&format!("{} **{}**\n\n", warning.icon, warning.message));
        md.push_str(&format!("{}  \n", warning.detail));
        md.push_str(&format!("*Advice:* {}\n", warning.advice));
    }
}
