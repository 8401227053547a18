use crate::config::Config;

/// How many comments the page shows up front and how big each
/// "load more" batch is. The store itself honours whatever count it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMorePolicy {
    pub initial_visible: usize,
    pub batch_size: usize,
}

impl Default for LoadMorePolicy {
    fn default() -> Self {
        Self {
            initial_visible: 5,
            batch_size: 10,
        }
    }
}

impl LoadMorePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_visible: config.comments_initial_visible.max(1),
            batch_size: config.comments_load_more_batch.max(1),
        }
    }

    /// Size of the next batch, `None` once nothing is left.
    pub fn next_batch(&self, remaining: usize) -> Option<usize> {
        if remaining == 0 {
            None
        } else {
            Some(remaining.min(self.batch_size))
        }
    }

    /// Label for the button under the initial listing; no button when
    /// everything fits on the page.
    pub fn initial_button_label(&self, total: usize) -> Option<String> {
        if total <= self.initial_visible {
            return None;
        }
        self.button_label(total - self.initial_visible)
    }

    pub fn button_label(&self, remaining: usize) -> Option<String> {
        match self.next_batch(remaining)? {
            1 => Some("Load 1 more Comment".to_string()),
            n => Some(format!("Load {} more Comments", n)),
        }
    }
}

pub fn count_label(total: i64) -> String {
    match total {
        0 => "No comments yet.".to_string(),
        1 => "1 comment".to_string(),
        n => format!("{} comments", n),
    }
}

pub fn replies_label(reply_count: i64) -> String {
    match reply_count {
        0 => "No replies yet.".to_string(),
        1 => "Show 1 reply".to_string(),
        n => format!("Show {} replies", n),
    }
}
