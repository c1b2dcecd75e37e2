use crate::error::RipError;
use crate::model::{normalize_label, ContainerType, RenditionDescriptor};

/// Which rendition to fetch. Empty selects the best video rendition.
#[derive(Debug, Clone, Default)]
pub struct RenditionSelector {
    pub label: Option<String>,
    pub container: Option<ContainerType>,
}

impl RenditionSelector {
    /// First match in `renditions` (sorted best first). With no constraints,
    /// audio-only renditions are passed over.
    pub fn select<'r>(&self, renditions: &'r [RenditionDescriptor]) -> Result<&'r RenditionDescriptor, RipError> {
        let wanted_label = self.label.as_deref().map(normalize_label);
        let unconstrained = wanted_label.is_none() && self.container.is_none();
        renditions
            .iter()
            .find(|r| {
                if unconstrained {
                    return r.container != ContainerType::Audio;
                }
                wanted_label.as_ref().map_or(true, |l| *l == r.normalized_label())
                    && self.container.map_or(true, |c| c == r.container)
            })
            .ok_or_else(|| {
                let available: Vec<String> = renditions
                    .iter()
                    .map(|r| format!("{}/{}", r.label, r.container))
                    .collect();
                RipError::input(
                    self.describe(),
                    format!("no matching rendition (available: {})", available.join(", ")),
                )
            })
    }

    fn describe(&self) -> String {
        match (&self.label, self.container) {
            (Some(l), Some(c)) => format!("{}/{}", l, c),
            (Some(l), None) => l.clone(),
            (None, Some(c)) => c.to_string(),
            (None, None) => "best".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(label: &str, height: u32, container: ContainerType) -> RenditionDescriptor {
        RenditionDescriptor {
            label: label.into(),
            height,
            container,
            url: format!("https://cdn.example.com/{}.{}", label, container.url_extension()),
            size_bytes: None,
            bitrate_kbps: None,
            fps: None,
        }
    }

    fn sample() -> Vec<RenditionDescriptor> {
        vec![
            r("audio", 0, ContainerType::Audio),
            r("720p", 720, ContainerType::Mp4),
            r("720p", 720, ContainerType::Tar),
            r("480p", 480, ContainerType::Mp4),
        ]
    }

    #[test]
    fn default_skips_audio() {
        let all = sample();
        let picked = RenditionSelector::default().select(&all).unwrap();
        assert_eq!((picked.label.as_str(), picked.container), ("720p", ContainerType::Mp4));
    }

    #[test]
    fn label_and_container() {
        let all = sample();
        let sel = RenditionSelector {
            label: Some("720P".into()),
            container: Some(ContainerType::Tar),
        };
        assert_eq!(sel.select(&all).unwrap().container, ContainerType::Tar);

        let audio = RenditionSelector {
            label: None,
            container: Some(ContainerType::Audio),
        };
        assert_eq!(audio.select(&all).unwrap().label, "audio");
    }

    #[test]
    fn no_match_is_input_error() {
        let sel = RenditionSelector {
            label: Some("1080p".into()),
            container: None,
        };
        assert!(matches!(sel.select(&sample()), Err(RipError::Input { .. })));
        assert!(RenditionSelector::default().select(&[]).is_err());
    }
}
