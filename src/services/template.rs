//! HTML wrapper document for SVG rendering.

/// Wrap SVG content in a minimal HTML document.
///
/// The background color fills the page and the scale is applied as a CSS
/// transform on the `svg` element itself, which is why a live bounding-box
/// measurement of that element already reflects the scale.
pub fn wrap_svg(svg: &str, background_color: &str, scale: f64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <style>
    * {{
      margin: 0;
      padding: 0;
      box-sizing: border-box;
    }}

    html, body {{
      width: 100%;
      height: 100%;
      background: {background_color};
      display: flex;
      align-items: center;
      justify-content: center;
    }}

    svg {{
      display: block;
      transform: scale({scale});
      transform-origin: center center;
    }}
  </style>
</head>
<body>
  {svg}
</body>
</html>"#
    )
}
