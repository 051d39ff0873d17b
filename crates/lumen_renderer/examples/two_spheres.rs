//! Two diffuse spheres under a spherical light.
//!
//! Renders single-threaded and saves to PPM format. Pass a JSON file as the
//! first argument to override the render settings, e.g.
//! `{ "samples_per_pixel": 64, "russian_roulette": 0.9 }`.

use lumen_renderer::{
    color_to_rgba, render, AcceleratorConfig, Camera, Color, DiffuseLight, ImageBuffer, Lambertian,
    RenderConfig, Scene, Sphere, SplitMethod, Triangle, Vec3,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => RenderConfig::default().with_samples(32),
    };

    let mut scene = build_scene();
    scene.build_accelerator_with(&AcceleratorConfig::new(SplitMethod::Sah, 4))?;

    let mut camera = Camera::new()
        .with_resolution(320, 180)
        .with_position(Vec3::new(0.0, 1.5, 6.0), Vec3::new(0.0, 0.8, 0.0), Vec3::Y)
        .with_fov(40.0);
    camera.initialize();

    let mut rng = StdRng::seed_from_u64(0);
    let image = render(&scene, &camera, &config, &mut rng)?;

    let filename = "two_spheres.ppm";
    save_ppm(&image, filename)?;
    log::info!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> Scene {
    let mut scene = Scene::new();

    // Ground made of two large triangles
    let ground = Lambertian::new(Color::new(0.6, 0.6, 0.6));
    let (a, b, c, d) = (
        Vec3::new(-20.0, 0.0, -20.0),
        Vec3::new(20.0, 0.0, -20.0),
        Vec3::new(20.0, 0.0, 20.0),
        Vec3::new(-20.0, 0.0, 20.0),
    );
    scene.add(Triangle::new(a, d, c, ground.clone()));
    scene.add(Triangle::new(a, c, b, ground));

    scene.add(Sphere::new(
        Vec3::new(-1.1, 1.0, 0.0),
        1.0,
        Lambertian::new(Color::new(0.8, 0.3, 0.2)),
    ));
    scene.add(Sphere::new(
        Vec3::new(1.1, 1.0, 0.0),
        1.0,
        Lambertian::new(Color::new(0.2, 0.4, 0.8)),
    ));

    // Light
    scene.add(Sphere::new(
        Vec3::new(0.0, 5.0, 1.0),
        0.75,
        DiffuseLight::new(Color::splat(30.0)),
    ));

    log::info!("Created {} primitives", scene.len());
    scene
}

fn save_ppm(image: &ImageBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for y in 0..image.height {
        for x in 0..image.width {
            let rgba = color_to_rgba(image.get(x, y));
            writeln!(writer, "{} {} {}", rgba[0], rgba[1], rgba[2])?;
        }
    }

    writer.flush()
}
