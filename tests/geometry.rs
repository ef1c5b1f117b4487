use intake::utils::{
    constant::CROP_OVERSCALE,
    geometry::{
        CropRect, Dimensions, ResizeMode, ResizePlan, ResizeTarget, Transform, cover_crop, fit,
        plan_transform, thumbnail_transform,
    },
};

#[test]
fn test_fit_into_box() {
    let source = Dimensions::new(800, 200);

    assert_eq!(
        fit(source, ResizeTarget::exact(Dimensions::new(200, 200))),
        Dimensions::new(200, 50)
    );
    assert_eq!(
        fit(
            source,
            ResizeTarget {
                width: None,
                height: Some(100)
            }
        ),
        Dimensions::new(400, 100)
    );
    assert_eq!(
        fit(
            source,
            ResizeTarget {
                width: Some(100),
                height: None
            }
        ),
        Dimensions::new(100, 25)
    );
}

#[test]
fn test_cover_crop_centers_the_box() {
    let transform = cover_crop(
        Dimensions::new(800, 200),
        Dimensions::new(200, 200),
        CROP_OVERSCALE,
    );

    assert_eq!(transform.output(), Dimensions::new(200, 200));
    match transform {
        Transform::ScaleThenCrop { scaled, crop } => {
            assert_eq!(scaled, Dimensions::new(1120, 280));
            assert_eq!(
                crop,
                CropRect {
                    x: 460,
                    y: 40,
                    width: 200,
                    height: 200
                }
            );
        }
        other => panic!("Expected a crop, got {other:?}"),
    }
}

#[test]
fn test_crop_mode_never_distorts() {
    let plan = ResizePlan {
        target: ResizeTarget::exact(Dimensions::new(200, 200)),
        mode: ResizeMode::Crop,
    };

    let transform = plan_transform(Dimensions::new(4000, 1000), plan);
    assert_eq!(transform.output(), Dimensions::new(200, 200));

    if let Transform::ScaleThenCrop { scaled, .. } = transform {
        assert!(scaled.width >= 200 && scaled.height >= 200);
        assert!(Dimensions::new(scaled.width, scaled.height).same_aspect_as(Dimensions::new(4, 1)));
    }
}

#[test]
fn test_plans() {
    let source = Dimensions::new(1000, 500);
    let target = ResizeTarget::exact(Dimensions::new(300, 300));

    let crop = plan_transform(
        source,
        ResizePlan {
            target,
            mode: ResizeMode::Crop,
        },
    );
    assert_eq!(crop.output(), Dimensions::new(300, 300));

    let portrait = plan_transform(
        source,
        ResizePlan {
            target,
            mode: ResizeMode::Portrait,
        },
    );
    assert_eq!(portrait, Transform::Scale(Dimensions::new(300, 150)));
}

#[test]
fn test_thumbnails() {
    let thumb = Dimensions::new(100, 50);

    assert_eq!(
        thumbnail_transform(Dimensions::new(400, 200), thumb),
        Transform::Scale(thumb)
    );
    assert_eq!(
        thumbnail_transform(Dimensions::new(300, 300), thumb).output(),
        thumb
    );
}
