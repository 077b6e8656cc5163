//! Display and annotation pass integration tests.

mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;

use common::small_config;
use scene_streamer::dual_render::{OTHER_ANNOTATION_COLOR, TARGET_ANNOTATION_COLOR};
use scene_streamer::resources::{rgb_hex, Shading};
use scene_streamer::{project, DualRenderer};

#[rstest]
#[case::single(1)]
#[case::several(5)]
fn annotation_twins_share_positions_and_class_colors(#[case] object_count: usize) {
    let renderer = DualRenderer::new(&small_config(object_count), &mut StdRng::seed_from_u64(7)).unwrap();
    let display = renderer.display().objects();
    let annotation = renderer.annotation().objects();
    assert_eq!(display.len(), 2 * object_count + 1);
    assert_eq!(display.len(), annotation.len());

    for (source, twin) in display.iter().zip(annotation) {
        assert_eq!(source.object.position(), twin.object.position());

        let material = twin.object.primitive.material().unwrap();
        assert_eq!(material.shading, Shading::Flat);
        let expected = if source.tag.starts_with("target") {
            TARGET_ANNOTATION_COLOR
        } else {
            OTHER_ANNOTATION_COLOR
        };
        assert_eq!(material.color(), rgb_hex(expected));
    }
}

#[test]
fn both_passes_see_the_same_boxes() {
    let mut renderer = DualRenderer::new(&small_config(4), &mut StdRng::seed_from_u64(3)).unwrap();
    renderer.render_frame().unwrap();

    let camera = renderer.display().camera();
    let camera = camera.read();
    for (source, twin) in renderer.display().objects().iter().zip(renderer.annotation().objects()) {
        assert_eq!(project(&source.object, &camera), project(&twin.object, &camera));
    }
}

#[test]
fn annotation_pixels_are_class_colors_only() {
    let mut renderer = DualRenderer::new(&small_config(6), &mut StdRng::seed_from_u64(9)).unwrap();
    renderer.render_frame().unwrap();

    let green = [0, 255, 0, 255];
    let blue = [0, 0, 255, 255];
    let clear = [0, 0, 0, 255];
    let mask = renderer.annotation().snapshot().unwrap();
    assert!(mask.pixels().all(|pixel| [green, blue, clear].contains(&pixel.0)));
    assert!(mask.pixels().any(|pixel| pixel.0 == blue));
}

#[test]
fn camera_moves_apply_to_both_passes() {
    let renderer = DualRenderer::new(&small_config(1), &mut StdRng::seed_from_u64(1)).unwrap();
    renderer
        .display()
        .camera()
        .write()
        .set_position(glam::Vec3::new(0.0, 5.0, 25.0));
    assert_eq!(
        renderer.annotation().camera().read().position,
        glam::Vec3::new(0.0, 5.0, 25.0)
    );
}
