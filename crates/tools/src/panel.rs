use experience_common::Disposable;

/// URL fragment that switches the debug panel on.
pub const DEBUG_FRAGMENT: &str = "#debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(usize);

/// One tweakable value. Choice controls store the selected index in `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub folder: FolderId,
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub options: Vec<String>,
    changed: bool,
}

impl Control {
    /// Selected option label for choice controls.
    pub fn selected(&self) -> Option<&str> {
        self.options.get(self.value as usize).map(String::as_str)
    }

    fn constrain(&self, value: f32) -> f32 {
        let (min, step) = (decimal(self.min), decimal(self.step));
        let snapped = if step > 0.0 {
            (min + ((f64::from(value) - min) / step).round() * step) as f32
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }
}

/// Widen `x` through its shortest decimal form, so a step of `0.001` snaps as
/// `0.001` and not as the f32 nearest to it.
fn decimal(x: f32) -> f64 {
    x.to_string().parse().unwrap_or(f64::from(x))
}

/// Developer panel of folders and ranged controls.
///
/// An inactive panel records nothing: every `add_*` returns `None`. After
/// `destroy` the panel behaves as inactive.
#[derive(Debug, Default)]
pub struct DebugPanel {
    active: bool,
    folders: Vec<String>,
    controls: Vec<Control>,
    destroyed: bool,
}

impl DebugPanel {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            ..Default::default()
        }
    }

    /// Active when the location fragment is exactly `#debug`.
    pub fn from_fragment(fragment: &str) -> Self {
        Self::new(fragment == DEBUG_FRAGMENT)
    }

    pub fn is_active(&self) -> bool {
        self.active && !self.destroyed
    }

    pub fn add_folder(&mut self, title: impl Into<String>) -> Option<FolderId> {
        if !self.is_active() {
            return None;
        }
        self.folders.push(title.into());
        Some(FolderId(self.folders.len() - 1))
    }

    /// Add a numeric control. The initial value is clamped into range.
    pub fn add_control(
        &mut self,
        folder: FolderId,
        name: impl Into<String>,
        value: f32,
        min: f32,
        max: f32,
        step: f32,
    ) -> Option<ControlId> {
        if !self.is_active() || folder.0 >= self.folders.len() || min.is_nan() || max.is_nan() {
            return None;
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let value = if value.is_nan() { min } else { value.clamp(min, max) };
        self.controls.push(Control {
            folder,
            name: name.into(),
            value,
            min,
            max,
            step,
            options: Vec::new(),
            changed: false,
        });
        Some(ControlId(self.controls.len() - 1))
    }

    /// Add a selector over `options`. Returns `None` for an empty list.
    pub fn add_choice(
        &mut self,
        folder: FolderId,
        name: impl Into<String>,
        options: Vec<String>,
        selected: usize,
    ) -> Option<ControlId> {
        let last = options.len().checked_sub(1)?;
        let id = self.add_control(folder, name, selected.min(last) as f32, 0.0, last as f32, 1.0)?;
        self.controls[id.0].options = options;
        Some(id)
    }

    /// Set a control, clamping to its range and snapping to its step.
    /// Non-finite input leaves the control unchanged. Returns the stored
    /// value, or `None` for an unknown control.
    pub fn set(&mut self, id: ControlId, value: f32) -> Option<f32> {
        if self.destroyed {
            return None;
        }
        let control = self.controls.get_mut(id.0)?;
        if !value.is_finite() {
            return Some(control.value);
        }
        let value = control.constrain(value);
        if value != control.value {
            control.value = value;
            control.changed = true;
            tracing::debug!(control = %control.name, value, "debug control changed");
        }
        Some(value)
    }

    pub fn value(&self, id: ControlId) -> Option<f32> {
        self.controls.get(id.0).map(|c| c.value)
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id.0)
    }

    /// Value of a control changed since the last call, clearing the flag.
    pub fn take_change(&mut self, id: ControlId) -> Option<f32> {
        let control = self.controls.get_mut(id.0)?;
        std::mem::take(&mut control.changed).then_some(control.value)
    }

    pub fn find(&self, folder: &str, name: &str) -> Option<ControlId> {
        self.controls
            .iter()
            .position(|c| c.name == name && self.folders.get(c.folder.0).is_some_and(|f| f == folder))
            .map(ControlId)
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Tear the panel down. Returns `true` only on the call that destroyed it.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        let had_ui = self.active;
        self.folders.clear();
        self.controls.clear();
        tracing::debug!(had_ui, "debug panel destroyed");
        had_ui
    }
}

impl Disposable for DebugPanel {
    fn release(&mut self) -> bool {
        self.destroy()
    }

    fn is_released(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with_control() -> (DebugPanel, ControlId) {
        let mut panel = DebugPanel::new(true);
        let env = panel.add_folder("environment").unwrap();
        let id = panel
            .add_control(env, "envMapIntensity", 0.4, 0.0, 4.0, 0.001)
            .unwrap();
        (panel, id)
    }

    #[test]
    fn fragment_activates() {
        assert!(DebugPanel::from_fragment("#debug").is_active());
        assert!(!DebugPanel::from_fragment("").is_active());
        assert!(!DebugPanel::from_fragment("#debugger").is_active());
    }

    #[test]
    fn inactive_panel_records_nothing() {
        let mut panel = DebugPanel::new(false);
        assert!(panel.add_folder("fox").is_none());
        assert!(panel.folders().is_empty());
    }

    #[test]
    fn set_clamps_and_snaps() {
        let (mut panel, id) = panel_with_control();
        assert_eq!(panel.set(id, 9.0), Some(4.0));
        assert_eq!(panel.set(id, -1.0), Some(0.0));
        let snapped = panel.set(id, 1.23456).unwrap();
        assert!((snapped - 1.235).abs() < 1e-4);
    }

    #[test]
    fn values_on_the_step_grid_stay_exact() {
        let (mut panel, id) = panel_with_control();
        assert_eq!(panel.set(id, 3.5), Some(3.5));
        assert_eq!(panel.set(id, 0.4), Some(0.4));

        let light = panel.add_folder("sun").unwrap();
        let intensity = panel.add_control(light, "sunlightIntensity", 4.0, 0.0, 10.0, 0.001).unwrap();
        assert_eq!(panel.set(intensity, 7.5), Some(7.5));
        assert_eq!(panel.value(intensity), Some(7.5));
    }

    #[test]
    fn non_finite_input_keeps_current_value() {
        let (mut panel, id) = panel_with_control();
        assert_eq!(panel.set(id, f32::NAN), Some(0.4));
        assert_eq!(panel.set(id, f32::INFINITY), Some(0.4));
        assert_eq!(panel.set(id, f32::NEG_INFINITY), Some(0.4));
        assert_eq!(panel.value(id), Some(0.4));
        assert_eq!(panel.take_change(id), None);

        let folder = panel.add_folder("bad").unwrap();
        assert!(panel.add_control(folder, "range", 1.0, f32::NAN, 2.0, 0.1).is_none());
        let id = panel.add_control(folder, "start", f32::NAN, 1.0, 2.0, 0.1).unwrap();
        assert_eq!(panel.value(id), Some(1.0));
    }

    #[test]
    fn changes_are_taken_once() {
        let (mut panel, id) = panel_with_control();
        assert_eq!(panel.take_change(id), None);
        panel.set(id, 2.0);
        assert_eq!(panel.take_change(id), Some(2.0));
        assert_eq!(panel.take_change(id), None);
        panel.set(id, 2.0);
        assert_eq!(panel.take_change(id), None);
    }

    #[test]
    fn choice_selects_by_index() {
        let mut panel = DebugPanel::new(true);
        let fox = panel.add_folder("fox").unwrap();
        let id = panel
            .add_choice(fox, "animation", vec!["idle".into(), "walking".into(), "running".into()], 0)
            .unwrap();
        panel.set(id, 2.4);
        assert_eq!(panel.control(id).unwrap().selected(), Some("running"));
        assert!(panel.add_choice(fox, "empty", Vec::new(), 0).is_none());
        assert_eq!(panel.find("fox", "animation"), Some(id));
    }

    #[test]
    fn destroy_is_idempotent() {
        let (mut panel, id) = panel_with_control();
        assert!(panel.destroy());
        assert!(!panel.destroy());
        assert!(panel.is_released());
        assert!(panel.set(id, 1.0).is_none());
        assert!(panel.add_folder("late").is_none());
    }

    #[test]
    fn destroying_inactive_panel_releases_nothing() {
        let mut panel = DebugPanel::new(false);
        assert!(!panel.release());
    }
}
