/// Terminal demo: a spinning textured cube rendered as ANSI cells.
///
/// The texture is a procedural checker gradient quantized against a
/// small fixed palette before rendering, so every printed cell color
/// comes from the palette.
use log::info;
use trast_core::{extract_palette, round_to_palette};
use trast_terminal::{checker_texture, cube_triangles, AppError, TerminalApp};

fn main() -> Result<(), AppError> {
    env_logger::init();

    let texture = checker_texture(32)?;

    // Quantize the texture down to a coarse palette so the terminal
    // only ever has to reproduce a handful of colors.
    let palette = vec![
        [20, 20, 40],
        [60, 120, 220],
        [220, 120, 60],
        [240, 220, 80],
        [240, 240, 240],
    ];
    let quantized = round_to_palette(&texture, &palette)?;
    info!(
        "texture quantized from {} colors to {}",
        extract_palette(&texture).len(),
        extract_palette(&quantized).len()
    );

    let mut app = TerminalApp::new(cube_triangles(2.0), quantized)?;
    app.run()
}
