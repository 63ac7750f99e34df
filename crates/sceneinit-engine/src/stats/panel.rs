use std::collections::VecDeque;

/// Samples kept for graphing.
const HISTORY_LEN: usize = 74;

/// One stats panel: latest value, extremes and a short history.
#[derive(Debug, Clone)]
pub struct Panel {
    name: &'static str,
    value: Option<f32>,
    min: f32,
    max: f32,
    history: VecDeque<f32>,
}

impl Panel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: None,
            min: f32::INFINITY,
            max: 0.0,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn push(&mut self, value: f32) {
        self.value = Some(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(value);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn min(&self) -> Option<f32> {
        self.value.map(|_| self.min)
    }

    pub fn max(&self) -> Option<f32> {
        self.value.map(|_| self.max)
    }

    /// Oldest first.
    pub fn history(&self) -> &VecDeque<f32> {
        &self.history
    }

    /// e.g. `"60 FPS (58-61)"`, or `"- FPS"` before the first sample.
    pub fn label(&self) -> String {
        match self.value {
            Some(v) => format!("{:.0} {} ({:.0}-{:.0})", v, self.name, self.min, self.max),
            None => format!("- {}", self.name),
        }
    }
}
