use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        NightworkError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(NightworkError::audio("x").to_string().contains("audio error:"));
    assert!(
        NightworkError::narration("x")
            .to_string()
            .contains("narration error:")
    );
    assert!(NightworkError::render("x").to_string().contains("render error:"));
    assert!(
        NightworkError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = NightworkError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
