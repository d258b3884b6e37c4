use experience_common::ReleaseReport;
use experience_kernel::HostPlatform;
use experience_render::Renderer;

use crate::root::SceneRoot;

/// Owner of the single live [`SceneRoot`] of a session.
///
/// Whoever owns the slot decides the lifetime of the experience; there is
/// no process-wide instance.
pub struct ExperienceSlot<H, R> {
    root: Option<SceneRoot<H, R>>,
}

impl<H, R> Default for ExperienceSlot<H, R> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<H, R> ExperienceSlot<H, R>
where
    H: HostPlatform,
    R: Renderer + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live root, building it with `init` only if there is none.
    pub fn get_or_create(&mut self, init: impl FnOnce() -> SceneRoot<H, R>) -> &mut SceneRoot<H, R> {
        if self.root.is_some() {
            tracing::debug!("experience already live, reusing it");
        }
        self.root.get_or_insert_with(init)
    }

    /// Like [`ExperienceSlot::get_or_create`] with a fallible constructor.
    pub fn try_get_or_create<E>(
        &mut self,
        init: impl FnOnce() -> Result<SceneRoot<H, R>, E>,
    ) -> Result<&mut SceneRoot<H, R>, E> {
        let root = match self.root.take() {
            Some(root) => {
                tracing::debug!("experience already live, reusing it");
                root
            }
            None => init()?,
        };
        Ok(self.root.insert(root))
    }

    pub fn get(&self) -> Option<&SceneRoot<H, R>> {
        self.root.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut SceneRoot<H, R>> {
        self.root.as_mut()
    }

    pub fn is_live(&self) -> bool {
        self.root.is_some()
    }

    /// Tear down and drop the live root. `None` if the slot was empty.
    pub fn destroy(&mut self) -> Option<ReleaseReport> {
        let mut root = self.root.take()?;
        Some(root.destroy())
    }
}
