use super::*;
use crate::config::FaceBackend;
use crate::test_support::{synthetic_landmarks, LogCapture};
use image::RgbImage;

#[test]
fn test_region_ranges_cover_all_landmarks() {
    let mut covered = vec![false; LANDMARK_COUNT];
    for region in FaceRegion::ALL {
        for i in region.range() {
            covered[i] = true;
        }
    }

    // Point 35 (nose tip, right side) belongs to no named region
    let uncovered: Vec<usize> = (0..LANDMARK_COUNT).filter(|i| !covered[*i]).collect();
    assert_eq!(uncovered, vec![35]);
}

#[test]
fn test_landmark_measurements() {
    let face = synthetic_landmarks((100.0, 200.0), (200.0, 300.0), (150.0, 260.0));

    assert_eq!(face.right_eye_outer(), Point::new(100.0, 200.0));
    assert_eq!(face.left_eye_outer(), Point::new(200.0, 300.0));
    assert_eq!(face.eye_midpoint(), Point::new(150.0, 250.0));
    assert_eq!(face.nose_bridge(), Point::new(150.0, 260.0));
    assert!((face.tilt_degrees() - 45.0).abs() < 1e-4);
    assert!((face.eye_distance() - 141.421_36).abs() < 1e-3);
}

#[test]
fn test_landmarks_require_68_points() {
    assert!(FaceLandmarks::new(vec![Point::default(); 5]).is_err());
    assert!(FaceLandmarks::new(vec![Point::default(); LANDMARK_COUNT]).is_ok());
}

#[test]
fn test_relative_box_center() {
    let bbox = RelativeBox {
        x: 0.2,
        y: 0.1,
        width: 0.4,
        height: 0.6,
        keypoints: vec![],
    };

    let center = bbox.center();
    assert!((center.x - 0.4).abs() < 1e-6);
    assert!((center.y - 0.4).abs() < 1e-6);
}

#[test]
fn test_parse_detector_output() {
    let landmarks: Vec<[f32; 2]> = (0..LANDMARK_COUNT).map(|i| [i as f32, 2.0 * i as f32]).collect();
    let json = serde_json::json!({
        "faces": [
            { "landmarks": landmarks },
            { "bbox": [0.25, 0.2, 0.5, 0.6], "keypoints": [[0.4, 0.4], [0.6, 0.4]] },
            { "bbox": [0.1, 0.1, 0.2, 0.2] }
        ]
    });

    let faces = parse_detector_output(json.to_string().as_bytes()).unwrap();
    assert_eq!(faces.len(), 3);

    match &faces[0] {
        FaceGeometry::Landmarks(face) => {
            assert_eq!(face.points()[36], Point::new(36.0, 72.0));
        }
        other => panic!("expected landmarks, got {:?}", other),
    }
    match &faces[1] {
        FaceGeometry::BoundingBox(bbox) => {
            assert_eq!(bbox.width, 0.5);
            assert_eq!(bbox.keypoints.len(), 2);
        }
        other => panic!("expected bounding box, got {:?}", other),
    }
    match &faces[2] {
        FaceGeometry::BoundingBox(bbox) => assert!(bbox.keypoints.is_empty()),
        other => panic!("expected bounding box, got {:?}", other),
    }
}

#[test]
fn test_parse_detector_output_without_faces() {
    assert!(parse_detector_output(br#"{"faces": []}"#).unwrap().is_empty());
    assert!(parse_detector_output(b"{}").unwrap().is_empty());
    assert!(parse_detector_output(b"not json").is_err());
    assert!(parse_detector_output(br#"{"faces": [{"landmarks": [[1.0, 2.0]]}]}"#).is_err());
}

#[test]
fn test_primary_face_picks_first_and_warns() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let first = FaceGeometry::Landmarks(synthetic_landmarks((1.0, 1.0), (9.0, 1.0), (5.0, 3.0)));
    let second = FaceGeometry::Landmarks(synthetic_landmarks((50.0, 1.0), (90.0, 1.0), (70.0, 3.0)));

    let picked = primary_face(vec![first.clone(), second], "IMG_1").unwrap();
    assert_eq!(picked, first);

    let output = logs.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("2 faces detected in IMG_1"));

    assert!(primary_face(Vec::new(), "IMG_2").is_none());
}

#[test]
fn test_external_provider_requires_model_asset() {
    let result = ExternalLandmarkProvider::new(
        "face-detector",
        "/nonexistent/shape_predictor_68_face_landmarks.dat",
        FaceBackend::Landmarks68,
    );
    assert!(result.is_err());

    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.dat");
    std::fs::write(&model, b"weights").unwrap();
    assert!(ExternalLandmarkProvider::new("face-detector", &model, FaceBackend::Landmarks68).is_ok());
}

#[cfg(unix)]
fn detector_script(dir: &std::path::Path, body: &str) -> (String, std::path::PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let model = dir.join("model.dat");
    std::fs::write(&model, b"weights").unwrap();

    let script = dir.join("detector.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    (script.to_string_lossy().into_owned(), model)
}

#[cfg(unix)]
/// Pseudo-random pixels so the PNG stays far above one pipe buffer
fn noise_frame(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_f491;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        };
        image::Rgb([next(), next(), next()])
    })
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_provider_runs_detector_process() {
    let dir = tempfile::tempdir().unwrap();
    let (script, model) = detector_script(
        dir.path(),
        "cat > /dev/null\necho '{\"faces\": [{\"bbox\": [0.25, 0.25, 0.5, 0.5]}]}'",
    );

    let provider = ExternalLandmarkProvider::new(&script, &model, FaceBackend::BoundingBox).unwrap();

    let faces = provider.detect(&RgbImage::new(8, 8)).await.unwrap();
    assert_eq!(faces.len(), 1);
    assert!(matches!(faces[0], FaceGeometry::BoundingBox(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_detector_logging_before_reading_frame() {
    let dir = tempfile::tempdir().unwrap();
    // 128 KiB of stderr before stdin is consumed fills the pipe if nobody reads it
    let (script, model) = detector_script(
        dir.path(),
        "head -c 131072 /dev/zero | tr '\\000' 'x' >&2\ncat > /dev/null\necho '{\"faces\": []}'",
    );
    let provider = ExternalLandmarkProvider::new(&script, &model, FaceBackend::Landmarks68)
        .unwrap()
        .with_timeout(std::time::Duration::from_secs(20));

    let frame = noise_frame(640, 360);
    let faces = tokio::time::timeout(std::time::Duration::from_secs(10), provider.detect(&frame))
        .await
        .expect("detector run should not stall")
        .unwrap();
    assert!(faces.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_detector_timeout_is_detection_error() {
    let dir = tempfile::tempdir().unwrap();
    let (script, model) = detector_script(dir.path(), "sleep 5\necho '{\"faces\": []}'");
    let provider = ExternalLandmarkProvider::new(&script, &model, FaceBackend::Landmarks68)
        .unwrap()
        .with_timeout(std::time::Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = provider.detect(&noise_frame(64, 36)).await.unwrap_err();

    assert!(started.elapsed() < std::time::Duration::from_secs(4));
    assert!(matches!(err, crate::error::StudioError::Detection { .. }));
    assert!(err.to_string().contains("timed out"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_detector_failure_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let (script, model) = detector_script(dir.path(), "echo 'model load failed' >&2\nexit 3");
    let provider = ExternalLandmarkProvider::new(&script, &model, FaceBackend::Landmarks68).unwrap();

    let err = provider.detect(&noise_frame(64, 36)).await.unwrap_err();
    assert!(matches!(err, crate::error::StudioError::Detection { .. }));
    assert!(err.to_string().contains("model load failed"));
}

#[test]
fn test_provider_timeout_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.dat");
    std::fs::write(&model, b"weights").unwrap();

    let mut config = crate::config::StudioConfig::default().face;
    assert!(ExternalLandmarkProvider::from_config(&config).is_err());

    config.detector_command = Some("face-detector".to_string());
    config.model_path = Some(model.to_string_lossy().into_owned());
    config.detector_timeout_seconds = 7;
    let provider = ExternalLandmarkProvider::from_config(&config).unwrap();
    assert_eq!(provider.timeout(), std::time::Duration::from_secs(7));
}

#[tokio::test]
async fn test_scripted_provider_answers_in_order() {
    let face = FaceGeometry::Landmarks(synthetic_landmarks((1.0, 1.0), (9.0, 1.0), (5.0, 3.0)));
    let provider = ScriptedLandmarkProvider::new(vec![Some(vec![face]), Some(vec![]), None]);
    let frame = RgbImage::new(4, 4);

    assert_eq!(provider.detect(&frame).await.unwrap().len(), 1);
    assert!(provider.detect(&frame).await.unwrap().is_empty());
    assert!(provider.detect(&frame).await.is_err());
    assert!(provider.detect(&frame).await.unwrap().is_empty());
    assert_eq!(provider.remaining(), 0);
}
