use array2im_core::config::RenderConfig;
use array2im_core::io::image_io::ImageFormat;
use console::Style;

use crate::terminal::Messages;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

/// Print the effective settings of a conversion (shown with `--verbose`).
pub fn print_render_summary(
    messages: &Messages,
    input: &str,
    output: &str,
    format: ImageFormat,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let s = Styles::new();
    let row = |label: &str, value: String| format!("  {:<14}{}", s.label.apply_to(label), value);

    messages.line("")?;
    messages.line(&format!("  {}", s.title.apply_to("array2im")))?;
    messages.line("")?;
    messages.line(&row("Input", s.path.apply_to(input).to_string()))?;
    messages.line(&row("Output", s.path.apply_to(output).to_string()))?;
    messages.line(&row(
        "Format",
        s.value.apply_to(format!("{format:?}")).to_string(),
    ))?;
    messages.line(&row(
        "Brightness",
        s.value.apply_to(config.colormap.brightness).to_string(),
    ))?;
    messages.line(&row(
        "Contrast",
        s.value.apply_to(config.colormap.contrast).to_string(),
    ))?;

    if format == ImageFormat::Jpeg {
        messages.line(&row(
            "Quality",
            s.value.apply_to(config.jpeg.quality.get()).to_string(),
        ))?;
        let progressive = if config.jpeg.progressive { "yes" } else { "no" };
        messages.line(&row("Progressive", s.value.apply_to(progressive).to_string()))?;
    } else {
        messages.line(&row(
            "JPEG options",
            s.disabled.apply_to("not used").to_string(),
        ))?;
    }
    messages.line("")
}
