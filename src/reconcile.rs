use std::collections::HashMap;

use crate::markers::Marker;
use crate::synthesis::{ExtractionRequest, SynthesisArtifact};

/// Join synthesis outcomes back onto the original marker sequence.
///
/// Each marker maps to the artifact matching its derived request identity;
/// repeated markers share one artifact. Failed or absent artifacts map to
/// `None`. Output order equals input marker order regardless of synthesis
/// completion order, so rendering can run a single left-to-right pass.
pub fn reconcile(
    markers: &[Marker],
    artifacts: &HashMap<ExtractionRequest, SynthesisArtifact>,
    source_video_id: &str,
) -> Vec<(Marker, Option<SynthesisArtifact>)> {
    markers
        .iter()
        .map(|marker| {
            let request = ExtractionRequest::from_marker(marker, source_video_id);
            let artifact = artifacts
                .get(&request)
                .filter(|a| a.present_on_disk)
                .cloned();
            (marker.clone(), artifact)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers;

    fn artifact_for(request: &ExtractionRequest, present: bool) -> SynthesisArtifact {
        SynthesisArtifact {
            request: request.clone(),
            relative_path: format!("/gifs/video_{}.gif", request.start_token),
            present_on_disk: present,
        }
    }

    #[test]
    fn test_order_preserved_with_shared_artifact() {
        // A and B dedup to the same request, C is distinct.
        let parsed = markers::parse(
            "[GIF: 00:10 - 00:12] mid [GIF: 00:10 - 00:12] end [GIF: 00:20 - 00:22]",
        );
        assert_eq!(parsed.len(), 3);

        let req_ab = ExtractionRequest::from_marker(&parsed[0], "video.mp4");
        let req_c = ExtractionRequest::from_marker(&parsed[2], "video.mp4");

        let mut artifacts = HashMap::new();
        artifacts.insert(req_ab.clone(), artifact_for(&req_ab, true));
        artifacts.insert(req_c.clone(), artifact_for(&req_c, true));

        let reconciled = reconcile(&parsed, &artifacts, "video.mp4");
        assert_eq!(reconciled.len(), 3);

        let path_a = &reconciled[0].1.as_ref().unwrap().relative_path;
        let path_b = &reconciled[1].1.as_ref().unwrap().relative_path;
        let path_c = &reconciled[2].1.as_ref().unwrap().relative_path;
        assert_eq!(path_a, path_b);
        assert_ne!(path_a, path_c);
    }

    #[test]
    fn test_failed_artifact_maps_to_none() {
        let parsed = markers::parse("[GIF: 00:10 - 00:12] [GIF: 00:20 - 00:22]");
        let req_ok = ExtractionRequest::from_marker(&parsed[0], "video.mp4");
        let req_failed = ExtractionRequest::from_marker(&parsed[1], "video.mp4");

        let mut artifacts = HashMap::new();
        artifacts.insert(req_ok.clone(), artifact_for(&req_ok, true));
        artifacts.insert(req_failed.clone(), artifact_for(&req_failed, false));

        let reconciled = reconcile(&parsed, &artifacts, "video.mp4");
        assert!(reconciled[0].1.is_some());
        assert!(reconciled[1].1.is_none());
    }

    #[test]
    fn test_missing_artifact_maps_to_none() {
        let parsed = markers::parse("[PHOTO: 00:00:10]");
        let reconciled = reconcile(&parsed, &HashMap::new(), "video.mp4");
        assert_eq!(reconciled.len(), 1);
        assert!(reconciled[0].1.is_none());
    }
}
