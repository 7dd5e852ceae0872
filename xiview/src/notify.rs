use crate::marking::MarkType;

type Callback = Box<dyn FnMut()>;
type MarkCallback = Box<dyn FnMut(MarkType)>;

/// Observers of the [`CompositeModel`](crate::CompositeModel), called synchronously after the
/// model reached a consistent state.
#[derive(Default)]
pub struct Notifications {
    filtering_done: Vec<Callback>,
    hidden_changed: Vec<Callback>,
    marked_changed: Vec<MarkCallback>,
}

impl std::fmt::Debug for Notifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifications")
            .field("filtering_done", &self.filtering_done.len())
            .field("hidden_changed", &self.hidden_changed.len())
            .field("marked_changed", &self.marked_changed.len())
            .finish()
    }
}

impl Notifications {
    /// Called once after every filter pass, read the new state from the model
    pub fn on_filtering_done(&mut self, callback: impl FnMut() + 'static) {
        self.filtering_done.push(Box::new(callback));
    }

    /// Called when the hidden state of any protein changed in a filter pass
    pub fn on_hidden_changed(&mut self, callback: impl FnMut() + 'static) {
        self.hidden_changed.push(Box::new(callback));
    }

    /// Called once both the marked matches and marked cross-links of a mark type settled, if any of them changed
    pub fn on_marked_changed(&mut self, callback: impl FnMut(MarkType) + 'static) {
        self.marked_changed.push(Box::new(callback));
    }

    pub(crate) fn filtering_done(&mut self) {
        for callback in &mut self.filtering_done {
            callback();
        }
    }

    pub(crate) fn hidden_changed(&mut self) {
        for callback in &mut self.hidden_changed {
            callback();
        }
    }

    pub(crate) fn marked_changed(&mut self, mark_type: MarkType) {
        for callback in &mut self.marked_changed {
            callback(mark_type);
        }
    }
}
