//! Step indicator derivation

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView<'a> {
    /// 1-based position
    pub number: usize,
    pub label: &'a str,
    pub status: StepStatus,
}

/// Status of the 1-based `index` when `current` is active
pub fn status_of(index: usize, current: usize) -> StepStatus {
    match index.cmp(&current) {
        std::cmp::Ordering::Less => StepStatus::Completed,
        std::cmp::Ordering::Equal => StepStatus::Active,
        std::cmp::Ordering::Greater => StepStatus::Upcoming,
    }
}

/// One view per label. `current` is clamped to `[1, labels.len()]`.
pub fn step_views<'a>(labels: &[&'a str], current: usize) -> Vec<StepView<'a>> {
    if labels.is_empty() {
        return Vec::new();
    }
    let current = current.clamp(1, labels.len());
    labels
        .iter()
        .copied()
        .enumerate()
        .map(|(i, label)| StepView {
            number: i + 1,
            label,
            status: status_of(i + 1, current),
        })
        .collect()
}
