use array2im_core::colormap::ColorMapParams;
use array2im_core::config::{JpegConfig, RenderConfig};
use array2im_core::io::image_io::JpegQuality;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_render_config_default() {
    let cfg = RenderConfig::default();
    assert_eq!(cfg.colormap, ColorMapParams::default());
    assert_eq!(cfg.jpeg.quality.get(), 95);
    assert!(!cfg.jpeg.progressive);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_encode_options_from_jpeg_config() {
    let cfg = RenderConfig {
        jpeg: JpegConfig {
            quality: JpegQuality::new(42).unwrap(),
            progressive: true,
        },
        ..Default::default()
    };
    let options = cfg.encode_options();
    assert_eq!(options.quality.get(), 42);
    assert!(options.progressive);
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

#[test]
fn test_toml_empty_uses_defaults() {
    let cfg: RenderConfig = toml::from_str("").unwrap();
    assert_eq!(cfg, RenderConfig::default());
}

#[test]
fn test_toml_partial_sections() {
    let cfg: RenderConfig = toml::from_str("[colormap]\ncontrast = 0.25\n").unwrap();
    assert_eq!(cfg.colormap.brightness, 1.0);
    assert_eq!(cfg.colormap.contrast, 0.25);
    assert_eq!(cfg.jpeg, JpegConfig::default());
}

#[test]
fn test_toml_full() {
    let src = r#"
[colormap]
brightness = 4.0
contrast = 1.5

[jpeg]
quality = 70
progressive = true
"#;
    let cfg: RenderConfig = toml::from_str(src).unwrap();
    assert_eq!(cfg.colormap.brightness, 4.0);
    assert_eq!(cfg.colormap.contrast, 1.5);
    assert_eq!(cfg.jpeg.quality.get(), 70);
    assert!(cfg.jpeg.progressive);
}

#[test]
fn test_toml_quality_out_of_range() {
    assert!(toml::from_str::<RenderConfig>("[jpeg]\nquality = 0\n").is_err());
    assert!(toml::from_str::<RenderConfig>("[jpeg]\nquality = 101\n").is_err());
    assert!(toml::from_str::<RenderConfig>("[jpeg]\nquality = 1\n").is_ok());
    assert!(toml::from_str::<RenderConfig>("[jpeg]\nquality = 100\n").is_ok());
}

#[test]
fn test_toml_serialize_quality_as_integer() {
    let text = toml::to_string(&RenderConfig::default()).unwrap();
    assert!(text.contains("quality = 95"), "got:\n{text}");
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_validate_rejects_non_finite() {
    let mut cfg = RenderConfig::default();
    cfg.colormap.brightness = f64::NAN;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("brightness"));

    let mut cfg = RenderConfig::default();
    cfg.colormap.contrast = f64::INFINITY;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("contrast"));
}

#[test]
fn test_validate_allows_negative() {
    let mut cfg = RenderConfig::default();
    cfg.colormap.brightness = -2.0;
    cfg.colormap.contrast = -1.0;
    assert!(cfg.validate().is_ok());
}
