/// Capability of owning a rendering resource that must be released explicitly.
///
/// `release` returns `true` only when this call freed the resource. A second
/// call on an already released value does nothing and returns `false`.
pub trait Disposable {
    fn release(&mut self) -> bool;

    fn is_released(&self) -> bool;
}

/// Counts of resources freed by one teardown pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
    pub controls: usize,
    pub renderers: usize,
    pub panels: usize,
}

impl ReleaseReport {
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.textures + self.controls + self.renderers + self.panels
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: ReleaseReport) {
        self.geometries += other.geometries;
        self.materials += other.materials;
        self.textures += other.textures;
        self.controls += other.controls;
        self.renderers += other.renderers;
        self.panels += other.panels;
    }
}

impl std::fmt::Display for ReleaseReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "released geometries={} materials={} textures={} controls={} renderers={} panels={}",
            self.geometries, self.materials, self.textures, self.controls, self.renderers, self.panels
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Buffer {
        released: bool,
    }

    impl Disposable for Buffer {
        fn release(&mut self) -> bool {
            !std::mem::replace(&mut self.released, true)
        }

        fn is_released(&self) -> bool {
            self.released
        }
    }

    #[test]
    fn release_is_idempotent() {
        let mut b = Buffer { released: false };
        assert!(b.release());
        assert!(b.is_released());
        assert!(!b.release());
    }

    #[test]
    fn report_merge_and_total() {
        let mut a = ReleaseReport {
            geometries: 2,
            materials: 1,
            ..Default::default()
        };
        a.merge(ReleaseReport {
            textures: 3,
            renderers: 1,
            ..Default::default()
        });
        assert_eq!(a.total(), 7);
        assert!(!a.is_empty());
        assert!(ReleaseReport::default().is_empty());
        assert!(a.to_string().contains("textures=3"));
    }
}
