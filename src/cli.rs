// ============================================================================
// Memerist CLI — headless meme rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   memerist --input template.png --text "TOP TEXT" --text "BOTTOM TEXT" -o out.png
//   memerist --input photo.jpg --deep-fry --seed 7 -o fried.png
//   memerist --project saved.mrp -o render.png
//   memerist --input cat.png --text "FINE" --save-project fine.mrp -o fine.png
//
// All processing runs synchronously on the current thread; only the filter
// kernels fan out across rayon's pool.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::LayerContent;
use crate::editor::Editor;
use crate::{log_err, log_info};

/// Memerist headless meme renderer.
///
/// Composite captions and stickers over a template image and export the
/// result — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "memerist",
    about = "Memerist headless meme renderer",
    long_about = "Load a template image or a saved .mrp project, overlay caption\n\
                  layers and global filters, and export the composite.\n\n\
                  Example:\n  \
                  memerist --input cat.png --text \"I CAN HAS\" --text \"CHEEZBURGER\" -o meme.png"
)]
pub struct CliArgs {
    /// Template image file (PNG, JPEG, WEBP or BMP).
    #[arg(short, long, value_name = "FILE", conflicts_with = "project")]
    pub input: Option<PathBuf>,

    /// Saved .mrp project file to load instead of a bare template.
    #[arg(short, long, value_name = "FILE.mrp")]
    pub project: Option<PathBuf>,

    /// Caption text. Repeatable; captions are spaced evenly down the image
    /// (one caption lands in the center, two make a top/bottom pair).
    #[arg(short, long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Font size for caption layers.
    #[arg(long, default_value_t = 60.0, value_name = "PX")]
    pub font_size: f32,

    /// Apply the deep-fry filter to the composite.
    #[arg(long)]
    pub deep_fry: bool,

    /// Apply the cinematic color grade to the composite.
    #[arg(long)]
    pub cinematic: bool,

    /// Noise seed for --deep-fry. The same seed always produces the same
    /// pixels.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub seed: u64,

    /// Output image path; format inferred from the extension.
    #[arg(short, long, required = true, value_name = "FILE")]
    pub output: PathBuf,

    /// Also save the assembled scene as a .mrp project file.
    #[arg(long, value_name = "FILE.mrp")]
    pub save_project: Option<PathBuf>,

    /// Print per-step timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run all CLI processing and return an OS exit code.
/// `0` = success, `1` = any step failed.
pub fn run(args: CliArgs) -> ExitCode {
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

/// The actual pipeline; failures have already been reported to stderr and
/// the session log by the time this returns.
fn execute(args: CliArgs) -> Result<(), ()> {
    let start = Instant::now();
    let mut editor = Editor::new();
    editor.set_noise_seed(args.seed);

    let load_result = match (&args.input, &args.project) {
        (Some(path), None) => editor.load_base(path),
        (None, Some(path)) => editor.load_project(path),
        (None, None) => {
            eprintln!("error: either --input or --project is required.");
            return Err(());
        }
        // clap's conflicts_with already rejects this pairing.
        (Some(_), Some(_)) => unreachable!(),
    };
    if let Err(e) = load_result {
        eprintln!("error: {}", e);
        log_err!("load failed: {}", e);
        return Err(());
    }

    // Captions, spaced evenly down the image.
    let count = args.text.len();
    for (i, caption) in args.text.iter().enumerate() {
        let idx = editor.add_text_layer();
        let layer = &mut editor.scene.layers[idx];
        if let LayerContent::Text { text, font_size } = &mut layer.content {
            *text = caption.clone();
            *font_size = args.font_size;
        }
        layer.y = (i + 1) as f32 / (count + 1) as f32;
    }

    if args.deep_fry {
        editor.set_deep_fry(true);
    }
    if args.cinematic {
        editor.set_cinematic(true);
    }

    if let Some(path) = &args.save_project {
        if let Err(e) = editor.save_project(path) {
            eprintln!("error: failed to save project: {}", e);
            log_err!("project save failed: {}", e);
            return Err(());
        }
        if args.verbose {
            println!("saved project {}", path.display());
        }
    }

    if let Err(e) = editor.export(&args.output) {
        eprintln!("error: failed to export: {}", e);
        log_err!("export failed: {}", e);
        return Err(());
    }

    if args.verbose {
        println!(
            "wrote {} in {:.1?} ({} caption{})",
            args.output.display(),
            start.elapsed(),
            count,
            if count == 1 { "" } else { "s" }
        );
    }
    log_info!("cli export finished in {:.1?}", start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Bitmap;
    use image::Rgba;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("memerist-cli-{}-{}", std::process::id(), name))
    }

    fn write_template(path: &PathBuf, w: u32, h: u32) {
        Bitmap::from_pixel(w, h, Rgba([180, 180, 180, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn renders_captions_to_output() {
        let input = temp_path("in.png");
        let output = temp_path("out.png");
        write_template(&input, 200, 150);

        let args = CliArgs {
            input: Some(input.clone()),
            project: None,
            text: vec!["TOP".into(), "BOTTOM".into()],
            font_size: 30.0,
            deep_fry: false,
            cinematic: false,
            seed: 0,
            output: output.clone(),
            save_project: None,
            verbose: false,
        };
        assert!(execute(args).is_ok());

        let out = image::open(&output).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (200, 150));
        // Captions leave non-gray pixels behind.
        assert!(out.pixels().any(|p| p[0] != 180));

        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn project_round_trip_through_cli() {
        let input = temp_path("in2.png");
        let output = temp_path("out2.png");
        let project = temp_path("proj.mrp");
        let output2 = temp_path("out3.png");
        write_template(&input, 64, 64);

        let args = CliArgs {
            input: Some(input.clone()),
            project: None,
            text: vec!["HI".into()],
            font_size: 20.0,
            deep_fry: true,
            cinematic: false,
            seed: 5,
            output: output.clone(),
            save_project: Some(project.clone()),
            verbose: false,
        };
        assert!(execute(args).is_ok());

        // Re-render from the saved project with the same seed: identical.
        let args = CliArgs {
            input: None,
            project: Some(project.clone()),
            text: vec![],
            font_size: 60.0,
            deep_fry: false,
            cinematic: false,
            seed: 5,
            output: output2.clone(),
            save_project: None,
            verbose: false,
        };
        assert!(execute(args).is_ok());

        let a = image::open(&output).unwrap().to_rgba8();
        let b = image::open(&output2).unwrap().to_rgba8();
        assert_eq!(a.as_raw(), b.as_raw());

        for p in [&input, &output, &project, &output2] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn missing_input_fails() {
        let args = CliArgs {
            input: Some(temp_path("does-not-exist.png")),
            project: None,
            text: vec![],
            font_size: 60.0,
            deep_fry: false,
            cinematic: false,
            seed: 0,
            output: temp_path("never.png"),
            save_project: None,
            verbose: false,
        };
        assert!(execute(args).is_err());
    }
}
