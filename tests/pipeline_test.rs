//! Library-level pipeline tests: generate → render, generate → estimate.

use rstest::rstest;
use tempfile::TempDir;

use levy_fractals::curve::{LevyIfs, LevyLSystem};
use levy_fractals::metrics::{estimate_with_dyadic_sizes, lacunarity};
use levy_fractals::render::{render_comparison, render_regression, Panel};
use levy_fractals::{
    render_points, BoundingBox, CurveGenerator, FractalError, GenerationParameters, Method,
    PlotMode, Point, RenderOptions, Result,
};

#[rstest]
#[case(640, 480)]
#[case(101, 257)]
#[case(1, 1)]
fn test_rendered_image_matches_figure_size(#[case] width: u32, #[case] height: u32) -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("curve.png");
    let points = GenerationParameters::lsystem(6, 45.0).generate()?;

    render_points(&points, &RenderOptions::new(&path).with_size(width, height))?;

    assert_eq!(image::image_dimensions(&path).expect("readable png"), (width, height));
    Ok(())
}

#[test]
fn test_render_overwrites_existing_file() -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("curve.png");
    std::fs::write(&path, b"stale").expect("seed file");

    let points = LevyIfs::classic(1_000)?.generate()?;
    render_points(
        &points,
        &RenderOptions::new(&path)
            .with_size(64, 64)
            .with_mode(PlotMode::Scatter),
    )?;

    assert_eq!(image::image_dimensions(&path).expect("readable png"), (64, 64));
    Ok(())
}

#[test]
fn test_rendered_curve_is_not_blank() -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("curve.png");
    let points = LevyLSystem::new(8, 45.0)?.generate()?;

    render_points(&points, &RenderOptions::new(&path).with_size(200, 200))?;

    let img = image::open(&path).expect("readable png").to_rgb8();
    let inked = img.pixels().filter(|p| p.0 != [255, 255, 255]).count();
    assert!(inked > 200, "only {inked} pixels drawn");
    Ok(())
}

#[test]
fn test_comparison_and_regression_render() -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let polyline = LevyLSystem::new(7, 45.0)?.generate()?;
    let cloud = LevyIfs::classic(2_000)?.generate()?;

    let compare = dir.path().join("compare.png");
    render_comparison(
        Panel::line(&polyline),
        Panel::scatter(&cloud),
        &RenderOptions::new(&compare).with_size(400, 200),
    )?;
    assert_eq!(image::image_dimensions(&compare).expect("readable png"), (400, 200));

    let estimate = estimate_with_dyadic_sizes(&polyline, 1, 4)?;
    let fit = dir.path().join("fit.png");
    render_regression(
        &estimate.log_inverse_sizes(),
        &estimate.log_counts(),
        estimate.estimated_slope,
        estimate.intercept,
        &RenderOptions::new(&fit).with_size(300, 225),
    )?;
    assert_eq!(image::image_dimensions(&fit).expect("readable png"), (300, 225));
    Ok(())
}

#[test]
fn test_levy_curve_dimension_is_between_line_and_plane() -> Result<()> {
    let points = GenerationParameters::lsystem(12, 45.0).generate()?;
    let estimate = estimate_with_dyadic_sizes(&points, 2, 5)?;
    assert!(
        (1.5..=2.1).contains(&estimate.estimated_slope),
        "slope = {}",
        estimate.estimated_slope
    );
    assert!(estimate.box_sizes.windows(2).all(|w| w[0] > w[1]));
    Ok(())
}

#[test]
fn test_ifs_cloud_shares_the_lsystem_attractor() -> Result<()> {
    // The L-system curve bulges down, the IFS attractor up: mirror before comparing
    let curve = LevyLSystem::new(14, 45.0)?.generate()?;
    let cloud = LevyIfs::classic(50_000)?.generate()?;
    let curve_bounds = BoundingBox::of(&curve).expect("non-empty");
    let cloud_bounds = BoundingBox::of(&cloud).expect("non-empty");

    assert!((curve_bounds.min_x - cloud_bounds.min_x).abs() < 0.05);
    assert!((curve_bounds.max_x - cloud_bounds.max_x).abs() < 0.05);
    assert!((curve_bounds.min_y + cloud_bounds.max_y).abs() < 0.05);
    assert!((curve_bounds.max_y + cloud_bounds.min_y).abs() < 0.05);
    Ok(())
}

#[test]
fn test_method_switch_changes_generator() -> Result<()> {
    let mut params = GenerationParameters::lsystem(5, 45.0);
    assert_eq!(params.generate()?.len(), 33);

    params.method = Method::Ifs;
    params.n_points = 123;
    assert_eq!(params.generate()?.len(), 123);
    Ok(())
}

#[test]
fn test_degenerate_point_set_is_rejected_everywhere() {
    let same = vec![Point::new(0.25, 0.75); 10];
    assert!(matches!(
        estimate_with_dyadic_sizes(&same, 1, 3),
        Err(FractalError::DegenerateInput(_))
    ));
    assert!(matches!(
        lacunarity(&same, &[0.5]),
        Err(FractalError::DegenerateInput(_))
    ));
}
