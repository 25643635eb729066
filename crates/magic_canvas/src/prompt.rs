const BASE_RULES: &str = "\
You are an expert photo retoucher and image editor.

TASK: Edit the image according to the user's request.

CONSTRAINTS:
- Preserve identity, background, and lighting as much as possible.
- Do not add text or watermarks.
- Output a single PNG image.
";

/// Full instruction text sent with an edit.
///
/// `has_mask` selects the masking section; `invert` and `feather` only shape it
/// when a mask is attached.
pub fn build_prompt(instruction: &str, has_mask: bool, invert: bool, feather: f32) -> String {
    let masking = if has_mask {
        let mode = if invert {
            "INVERT MODE: The mask indicates PROTECTED region; edit everything else."
        } else {
            "DEFAULT MODE: The mask indicates EDITABLE region; edit only inside it."
        };
        let edges = if feather > 0.0 {
            format!("Mask edges are feathered by ~{}px. Blend seamlessly at the boundary.", feather.round())
        } else {
            "Mask edges are crisp.".to_string()
        };
        format!(
            "MASKING:\n\
             - A mask image is provided as the SECOND image.\n\
             - White pixels = editable, black pixels = protected.\n\
             - {mode}\n\
             - {edges}\n\
             - Keep all protected pixels unchanged (pixel-perfect if possible).\n"
        )
    } else {
        "MASKING:\n\
         - No mask provided. Apply the edit to the whole image, while preserving identity/background.\n"
            .to_string()
    };

    format!("{BASE_RULES}\n{masking}\nUSER REQUEST:\n{}\n", instruction.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_prompt_mentions_mode_and_feather() {
        let prompt = build_prompt("  remove the logo ", true, false, 7.6);
        assert!(prompt.contains("DEFAULT MODE"));
        assert!(prompt.contains("feathered by ~8px"));
        assert!(prompt.ends_with("USER REQUEST:\nremove the logo\n"));
    }

    #[test]
    fn test_unmasked_prompt_ignores_modifiers() {
        let prompt = build_prompt("brighter", false, true, 12.0);
        assert!(prompt.contains("No mask provided"));
        assert!(!prompt.contains("INVERT MODE"));
        assert!(!prompt.contains("feathered"));
    }

    #[test]
    fn test_inverted_crisp_prompt() {
        let prompt = build_prompt("x", true, true, 0.0);
        assert!(prompt.contains("INVERT MODE"));
        assert!(prompt.contains("Mask edges are crisp."));
    }
}
