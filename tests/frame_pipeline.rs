use quote_shorts::config::Config;
use quote_shorts::render::background::BackgroundRenderer;
use quote_shorts::render::frame::FrameComposer;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn test_config(root: &Path) -> Config {
    Config {
        quotes_dir: root.join("quotes"),
        images_dir: root.join("images"),
        frames_dir: root.join("frames"),
        output_dir: root.join("output"),
        audio_dir: root.join("audio"),
        history_file: root.join("quotes_history.txt"),
        // quarter-size raster keeps the test quick
        width: 270,
        height: 480,
        ..Config::default()
    }
}

#[test]
fn one_frame_per_quote_in_input_order() {
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path());
    cfg.ensure_directories().unwrap();

    let quotes = [
        "\"We all go a little mad sometimes.\" - Psycho (1960)",
        "\"They're here.\" - Poltergeist (1982)",
        "\"Be afraid. Be very afraid.\" - The Fly (1986)",
    ];

    let renderer = BackgroundRenderer::new(&cfg);
    let composer = FrameComposer::new(&cfg);

    let mut frames = Vec::new();
    for (i, quote) in quotes.iter().enumerate() {
        let background = renderer.render(i);
        assert!(background.path().exists());
        frames.push(composer.compose(background.path(), quote, i).into_path());
    }

    assert_eq!(frames.len(), quotes.len());
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(
            frame.file_name().unwrap().to_string_lossy(),
            format!("frame_{}.png", i + 1)
        );
        assert!(fs::metadata(frame).unwrap().len() > 0);
        let img = image::open(frame).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (cfg.width, cfg.height));
    }
}

#[test]
fn missing_background_still_yields_a_frame() {
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path());
    cfg.ensure_directories().unwrap();

    let composer = FrameComposer::new(&cfg);
    let frame = composer.compose(
        &tmp.path().join("no_such_background.png"),
        "\"It's alive!\" - Frankenstein (1931)",
        0,
    );

    assert!(frame.path().exists());
    assert!(fs::metadata(frame.path()).unwrap().len() > 0);
}

#[test]
fn mismatched_background_is_resized_to_the_target() {
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path());
    cfg.ensure_directories().unwrap();

    // Background at the wrong resolution: the composer must normalize it.
    let odd = image::RgbImage::from_pixel(64, 64, image::Rgb([120, 0, 0]));
    let odd_path = cfg.images_dir.join("odd.png");
    odd.save(&odd_path).unwrap();

    let composer = FrameComposer::new(&cfg);
    let frame = composer.compose(&odd_path, "\"Here's Johnny!\" - The Shining (1980)", 0);

    let img = image::open(frame.path()).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (cfg.width, cfg.height));
}
