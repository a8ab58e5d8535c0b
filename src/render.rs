use tracing::warn;

use crate::markers::Marker;
use crate::synthesis::SynthesisArtifact;

/// Rewrite a document by replacing each marker occurrence with its
/// reconciled outcome.
///
/// Replacement is positional: the Nth occurrence of a marker's text is
/// replaced with the Nth reconciled result, scanning left to right with a
/// cursor. A global replace would break documents where the same literal
/// marker appears multiple times and needs different outcomes.
///
/// Successful artifacts render as image references; failed ones render as a
/// visible placeholder carrying the original timestamp. A document with no
/// markers comes back unchanged.
pub fn substitute(
    document_text: &str,
    reconciled: &[(Marker, Option<SynthesisArtifact>)],
) -> String {
    let mut output = String::with_capacity(document_text.len());
    let mut cursor = 0;

    for (marker, artifact) in reconciled {
        let Some(offset) = document_text[cursor..].find(&marker.raw_text) else {
            // Marker text not found past the cursor: the reconciled list no
            // longer matches the document. Leave the rest untouched.
            warn!("Marker not found during substitution: {}", marker.raw_text);
            continue;
        };

        let start = cursor + offset;
        output.push_str(&document_text[cursor..start]);
        output.push_str(&replacement_for(marker, artifact.as_ref()));
        cursor = start + marker.raw_text.len();
    }

    output.push_str(&document_text[cursor..]);
    output
}

fn replacement_for(marker: &Marker, artifact: Option<&SynthesisArtifact>) -> String {
    match artifact {
        Some(artifact) => format!(
            "![{}]({})",
            marker.timestamp_label(),
            artifact.relative_path
        ),
        None => format!("*(capture unavailable: {})*", marker.timestamp_label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers;
    use crate::synthesis::ExtractionRequest;

    fn artifact(marker: &Marker, path: &str) -> SynthesisArtifact {
        SynthesisArtifact {
            request: ExtractionRequest::from_marker(marker, "video.mp4"),
            relative_path: path.to_string(),
            present_on_disk: true,
        }
    }

    #[test]
    fn test_no_markers_returns_document_unchanged() {
        let text = "# Guide\n\nNothing visual here.";
        assert_eq!(substitute(text, &[]), text);
    }

    #[test]
    fn test_successful_artifact_becomes_image_reference() {
        let text = "Step 1. [GIF: 00:05 - 00:08] Done.";
        let parsed = markers::parse(text);
        let reconciled = vec![(
            parsed[0].clone(),
            Some(artifact(&parsed[0], "/gifs/video_00_05.gif")),
        )];

        assert_eq!(
            substitute(text, &reconciled),
            "Step 1. ![00:05 - 00:08](/gifs/video_00_05.gif) Done."
        );
    }

    #[test]
    fn test_failed_artifact_becomes_placeholder() {
        let text = "Step 1. [PHOTO: 00:00:20] Done.";
        let parsed = markers::parse(text);
        let reconciled = vec![(parsed[0].clone(), None)];

        assert_eq!(
            substitute(text, &reconciled),
            "Step 1. *(capture unavailable: 00:00:20)* Done."
        );
    }

    #[test]
    fn test_identical_markers_replaced_positionally() {
        // Same literal marker twice, different outcomes: the first occurrence
        // gets the first result, the second gets the second.
        let text = "A [GIF: 00:05 - 00:08] B [GIF: 00:05 - 00:08] C";
        let parsed = markers::parse(text);
        let reconciled = vec![
            (
                parsed[0].clone(),
                Some(artifact(&parsed[0], "/gifs/video_00_05.gif")),
            ),
            (parsed[1].clone(), None),
        ];

        assert_eq!(
            substitute(text, &reconciled),
            "A ![00:05 - 00:08](/gifs/video_00_05.gif) B *(capture unavailable: 00:05 - 00:08)* C"
        );
    }

    #[test]
    fn test_partial_failure_renders_both_outcomes() {
        let text = "First [GIF: 00:10 - 00:12] then [GIF: 00:20 - 00:22].";
        let parsed = markers::parse(text);
        let reconciled = vec![
            (
                parsed[0].clone(),
                Some(artifact(&parsed[0], "/gifs/video_00_10.gif")),
            ),
            (parsed[1].clone(), None),
        ];

        let rendered = substitute(text, &reconciled);
        assert!(rendered.contains("![00:10 - 00:12](/gifs/video_00_10.gif)"));
        assert!(rendered.contains("*(capture unavailable: 00:20 - 00:22)*"));
        assert!(!rendered.contains("[GIF:"));
    }

    #[test]
    fn test_surrounding_structure_untouched() {
        let text = "# Title\n\n1. Step one\n[GIF: 00:05 - 00:08]\n2. Step two\n";
        let parsed = markers::parse(text);
        let reconciled = vec![(
            parsed[0].clone(),
            Some(artifact(&parsed[0], "/gifs/video_00_05.gif")),
        )];

        let rendered = substitute(text, &reconciled);
        assert!(rendered.starts_with("# Title\n\n1. Step one\n"));
        assert!(rendered.ends_with("\n2. Step two\n"));
    }
}
