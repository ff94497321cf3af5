use cvmark_codec::{lookup, Palette, PROFILES};
use cvmark_core::{Area, Bitmap, Color, ColorLumaTable, LumaCache, Rgba, RgbaImage};
use cvmark_detect::{
    locate, RecognizeOutput, Recognizer, RecognizerParams, RejectReason, ScanWindow,
};
use cvmark_print::render_bitmap;

fn bitmap(profile: &str, value: u64, cell_px: usize) -> RgbaImage {
    let p = lookup(profile).expect("profile");
    render_bitmap(&p, value, cell_px, &Palette::default()).expect("render")
}

fn recognize(params: RecognizerParams, img: &RgbaImage) -> RecognizeOutput {
    Recognizer::new(params)
        .expect("recognizer")
        .recognize(img)
        .expect("recognize")
}

/// Copy `src` into `dst` with its top-left corner at `(x, y)`.
fn blit(dst: &mut RgbaImage, src: &RgbaImage, x: usize, y: usize) {
    for sy in 0..src.height {
        for sx in 0..src.width {
            dst.put_pixel(x + sx, y + sy, src.pixel(sx, sy));
        }
    }
}

fn rotate_half_turn(src: &RgbaImage) -> RgbaImage {
    let mut out = RgbaImage::new(src.width, src.height);
    for y in 0..src.height {
        for x in 0..src.width {
            out.put_pixel(src.width - 1 - x, src.height - 1 - y, src.pixel(x, y));
        }
    }
    out
}

#[test]
fn every_profile_round_trips() {
    for profile in PROFILES {
        let limit = profile.value_limit();
        let mut values = vec![0, limit - 1, limit / 2, limit / 3];
        values.dedup();
        for value in values {
            let img = bitmap(profile.name, value, 6);
            let params = RecognizerParams {
                provide_errors: true,
                ..RecognizerParams::for_profile(profile.name)
            };
            let out = recognize(params, &img);
            assert_eq!(out.values(), vec![value], "{} value {value}", profile.name);
            assert_eq!(out.markers[0].errors, Some(false));
        }
    }
}

#[test]
fn marker_44o_300_at_ten_pixels() {
    let img = bitmap("44O", 300, 10);
    assert_eq!((img.width, img.height), (120, 120));

    let out = recognize(RecognizerParams::default(), &img);
    assert_eq!(out.values(), vec![300]);
    let marker = &out.markers[0];
    assert!(marker.area.is_none());
    assert!(marker.matrix.is_none());
    assert!(marker.grid.is_none());
    assert!(marker.errors.is_none());
    assert!(out.timing.is_none());
    assert!(out.rejected.is_empty());

    let json = serde_json::to_string(&out).expect("json");
    assert_eq!(json, r#"{"markers":[{"value":300}]}"#);
}

#[test]
fn diagnostics_describe_the_region() {
    let img = bitmap("44O", 300, 10);
    let out = recognize(RecognizerParams::default().with_diagnostics(), &img);
    assert_eq!(out.values(), vec![300]);

    let marker = &out.markers[0];
    assert_eq!(marker.area, Some(Area::new(20, 20, 80, 80)));
    let matrix = marker.matrix.as_ref().expect("matrix");
    assert_eq!((matrix.cols, matrix.rows), (8, 8));
    // frame ring and first orientation cell
    assert_eq!(matrix.get(0, 0), Some(true));
    assert_eq!(matrix.get(2, 2), Some(true));

    let grid = marker.grid.as_ref().expect("grid");
    assert_eq!(grid.cells.len(), 64);
    assert_eq!((grid.width, grid.height), (87, 87));
    assert_eq!(grid.compose().pixel(0, 0), Rgba::BLACK);

    let timing = out.timing.as_ref().expect("timing");
    assert_eq!(timing.steps.len(), 5);
    // payload cells inside the frame are reported as nested
    assert!(out
        .rejected
        .iter()
        .all(|r| Area::new(20, 20, 80, 80).encloses(&r.area)));
}

#[test]
fn locator_finds_the_frame_first() {
    let img = bitmap("66O", 99_999, 5);
    let profile = lookup("66O").expect("66O");
    let table = ColorLumaTable::new();
    let mut cache = LumaCache::new(&table);
    let mut steps = 0;
    let areas = locate(&img, img.bounds(), &profile, 0.5, &mut cache, || steps += 1);
    assert_eq!(steps, 3);
    // 10 body cells of 5px after a 2-cell quiet zone
    assert_eq!(areas.first(), Some(&Area::new(10, 10, 50, 50)));
    assert!(areas.iter().all(|a| areas[0].encloses(a)));
}

#[test]
fn single_cell_error_is_corrected() {
    let mut img = bitmap("44O", 300, 10);
    // payload cell (1, 0) sits at marker cell (5, 4)
    let cell = Area::new(50, 40, 10, 10);
    let flipped = if img.pixel(55, 45) == Rgba::BLACK {
        Rgba::WHITE
    } else {
        Rgba::BLACK
    };
    img.fill_area(cell, flipped);

    let params = RecognizerParams {
        provide_errors: true,
        ..RecognizerParams::default()
    };
    let out = recognize(params, &img);
    assert_eq!(out.values(), vec![300]);
    assert_eq!(out.markers[0].errors, Some(true));
}

#[test]
fn uniform_bitmaps_have_no_markers() {
    for color in [Rgba::WHITE, Rgba::BLACK, Rgba::rgb(128, 128, 128)] {
        let img = RgbaImage::filled(64, 48, color);
        for detect_dark_light in [false, true] {
            let params = RecognizerParams {
                detect_dark_light,
                ..RecognizerParams::default()
            };
            assert!(recognize(params, &img).markers.is_empty());
        }
    }
}

#[test]
fn area_tracks_placement_on_a_larger_canvas() {
    let marker = bitmap("33O", 5, 7);
    let mut canvas = RgbaImage::filled(200, 150, Rgba::WHITE);
    blit(&mut canvas, &marker, 37, 23);

    let params = RecognizerParams {
        provide_area: true,
        ..RecognizerParams::for_profile("33O")
    };
    let out = recognize(params, &canvas);
    assert_eq!(out.values(), vec![5]);
    // frame starts two cells into the quiet zone; body is 7 cells
    let area = out.markers[0].area.expect("area");
    let expected = Area::new(37 + 14, 23 + 14, 49, 49);
    assert!(area.x.abs_diff(expected.x) <= 1 && area.y.abs_diff(expected.y) <= 1);
    assert!(area.w.abs_diff(expected.w) <= 1 && area.h.abs_diff(expected.h) <= 1);
}

#[test]
fn scan_window_limits_the_search() {
    let left = bitmap("44N", 17, 6);
    let right = bitmap("44N", 2000, 6);
    // diagonal layout: the markers share no rows or columns
    let mut canvas = RgbaImage::filled(200, 200, Rgba::WHITE);
    blit(&mut canvas, &left, 10, 10);
    blit(&mut canvas, &right, 110, 110);

    let full = recognize(RecognizerParams::for_profile("44N"), &canvas);
    assert_eq!(full.values(), vec![17, 2000]);

    let params = RecognizerParams {
        scan_window: ScanWindow {
            x: -100,
            ..ScanWindow::FULL
        },
        ..RecognizerParams::for_profile("44N")
    };
    assert_eq!(recognize(params, &canvas).values(), vec![2000]);
}

#[test]
fn second_marker_on_the_same_rows_is_missed() {
    let left = bitmap("44N", 17, 6);
    let right = bitmap("44N", 2000, 6);
    let mut canvas = RgbaImage::filled(200, 100, Rgba::WHITE);
    blit(&mut canvas, &left, 10, 10);
    blit(&mut canvas, &right, 110, 10);

    // a dark sample after the epilog resets the line, so the right frame
    // is never entered from a light prolog
    let values = recognize(RecognizerParams::for_profile("44N"), &canvas).values();
    assert!(values.contains(&17));
    assert!(!values.contains(&2000));

    // the same marker alone is found
    let mut alone = RgbaImage::filled(200, 100, Rgba::WHITE);
    blit(&mut alone, &right, 110, 10);
    assert_eq!(
        recognize(RecognizerParams::for_profile("44N"), &alone).values(),
        vec![2000]
    );
}

#[test]
fn uncorrectable_region_does_not_block_others() {
    let mut bad = bitmap("44O", 0, 10);
    // payload cells (2, 1) and (0, 2): two errors in one codeword
    for cell in [Area::new(60, 50, 10, 10), Area::new(40, 60, 10, 10)] {
        let flipped = if bad.pixel(cell.x + 5, cell.y + 5) == Rgba::BLACK {
            Rgba::WHITE
        } else {
            Rgba::BLACK
        };
        bad.fill_area(cell, flipped);
    }
    let good = bitmap("44O", 300, 10);
    let mut canvas = RgbaImage::filled(250, 250, Rgba::WHITE);
    blit(&mut canvas, &bad, 0, 0);
    blit(&mut canvas, &good, 130, 130);

    let params = RecognizerParams {
        provide_errors: true,
        ..RecognizerParams::default()
    };
    let out = recognize(params, &canvas);
    assert_eq!(out.values(), vec![300]);
    let uncorrectable: Vec<_> = out
        .rejected
        .iter()
        .filter(|r| r.reason == RejectReason::Uncorrectable)
        .collect();
    assert_eq!(uncorrectable.len(), 1);
    assert_eq!(uncorrectable[0].area, Area::new(20, 20, 80, 80));
}

#[test]
fn low_contrast_needs_dark_light_detection() {
    let p = lookup("44O").expect("44O");
    let palette = Palette {
        foreground: Color::Solid(Rgba::rgb(60, 60, 60)),
        background: Color::Solid(Rgba::rgb(180, 180, 180)),
    };
    let img = render_bitmap(&p, 77, 8, &palette).expect("render");

    // light gray is below the fixed 0.5 threshold, so nothing reads light
    assert!(recognize(RecognizerParams::default(), &img).markers.is_empty());

    let params = RecognizerParams {
        detect_dark_light: true,
        ..RecognizerParams::default()
    };
    assert_eq!(recognize(params, &img).values(), vec![77]);
}

#[test]
fn orientation_check_rejects_rotated_marker() {
    let img = rotate_half_turn(&bitmap("44O", 300, 10));
    let params = RecognizerParams {
        check_orientation: true,
        provide_errors: true,
        ..RecognizerParams::default()
    };
    let out = recognize(params, &img);
    assert!(out.markers.is_empty());
    assert!(out
        .rejected
        .iter()
        .any(|r| r.reason == RejectReason::Orientation && r.area == Area::new(20, 20, 80, 80)));
}

#[test]
fn recognizer_is_reusable() {
    let rec = Recognizer::new(RecognizerParams::for_profile("55O")).expect("recognizer");
    for value in [1u64, 4242, 131_071] {
        let img = bitmap("55O", value, 5);
        assert_eq!(rec.recognize(&img).expect("recognize").values(), vec![value]);
    }
    assert_eq!(rec.known_colors(), 2);
}
