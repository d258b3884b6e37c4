/// Default cross-fade between two actions, in seconds.
const CROSS_FADE: f32 = 1.0;

/// One playable clip of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    /// Name the world uses (`idle`, `walking`, ...).
    pub label: String,
    /// Clip name inside the model.
    pub clip: String,
    /// Local playback time in seconds.
    pub time: f32,
    pub weight: f32,
}

/// Plays one action at a time and cross-fades when switching.
///
/// Advanced by the frame delta; the rendering engine samples `time` and
/// `weight` of every action to pose the skeleton.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
    current: usize,
    previous: Option<usize>,
    fade: f32,
    fade_duration: f32,
    time: f32,
}

impl AnimationMixer {
    /// `actions` pairs a label with a model clip. The first action plays.
    /// Returns `None` when there are no actions.
    pub fn new(actions: impl IntoIterator<Item = (String, String)>) -> Option<Self> {
        let actions: Vec<AnimationAction> = actions
            .into_iter()
            .map(|(label, clip)| AnimationAction {
                label,
                clip,
                time: 0.0,
                weight: 0.0,
            })
            .collect();
        if actions.is_empty() {
            return None;
        }
        let mut mixer = Self {
            actions,
            current: 0,
            previous: None,
            fade: 0.0,
            fade_duration: CROSS_FADE,
            time: 0.0,
        };
        mixer.actions[0].weight = 1.0;
        Some(mixer)
    }

    /// Switch to action `index`, fading out the current one.
    /// Returns `false` if `index` is out of range or already playing.
    pub fn play(&mut self, index: usize) -> bool {
        if index >= self.actions.len() || index == self.current {
            return false;
        }
        if let Some(stale) = self.previous.take() {
            self.actions[stale].weight = 0.0;
        }
        self.previous = Some(self.current);
        self.current = index;
        self.fade = 0.0;
        self.actions[index].time = 0.0;
        self.actions[index].weight = 0.0;
        tracing::debug!(action = %self.actions[index].label, "animation cross-fade started");
        true
    }

    pub fn play_label(&mut self, label: &str) -> bool {
        self.actions
            .iter()
            .position(|a| a.label == label)
            .is_some_and(|i| self.play(i))
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.actions[self.current].time += dt;
        match self.previous {
            Some(prev) => {
                self.actions[prev].time += dt;
                self.fade += dt;
                let t = (self.fade / self.fade_duration).min(1.0);
                self.actions[self.current].weight = t;
                self.actions[prev].weight = 1.0 - t;
                if t >= 1.0 {
                    self.previous = None;
                }
            }
            None => self.actions[self.current].weight = 1.0,
        }
    }

    pub fn current(&self) -> &AnimationAction {
        &self.actions[self.current]
    }

    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    pub fn is_fading(&self) -> bool {
        self.previous.is_some()
    }

    /// Total time the mixer has been advanced.
    pub fn time(&self) -> f32 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer() -> AnimationMixer {
        AnimationMixer::new(
            [("idle", "Survey"), ("walking", "Walk"), ("running", "Run")]
                .map(|(l, c)| (l.to_string(), c.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn first_action_plays() {
        let mut m = mixer();
        m.update(0.5);
        assert_eq!(m.current().label, "idle");
        assert_eq!(m.current().time, 0.5);
        assert_eq!(m.current().weight, 1.0);
        assert!(AnimationMixer::new(Vec::new()).is_none());
    }

    #[test]
    fn cross_fade_shifts_weight() {
        let mut m = mixer();
        assert!(m.play(2));
        m.update(0.25);
        assert!(m.is_fading());
        assert!((m.actions()[2].weight - 0.25).abs() < 1e-6);
        assert!((m.actions()[0].weight - 0.75).abs() < 1e-6);
        m.update(1.0);
        assert!(!m.is_fading());
        assert_eq!(m.actions()[0].weight, 0.0);
        assert_eq!(m.current().clip, "Run");
    }

    #[test]
    fn replaying_current_is_noop() {
        let mut m = mixer();
        assert!(!m.play(0));
        assert!(!m.play(7));
        assert!(m.play_label("walking"));
        assert!(!m.play_label("flying"));
    }
}
