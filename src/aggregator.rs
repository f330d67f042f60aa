use crate::models::Amounts;

/// Classification codes that get a running subtotal.
pub const CLASS_CODES: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Six running sums per classification code.
#[derive(Debug, Default, Clone)]
pub struct ClassTotals {
    buckets: [Amounts; 9],
}

impl ClassTotals {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(class_block: &str) -> Option<usize> {
        CLASS_CODES.iter().position(|c| *c == class_block)
    }

    pub fn accumulate(&mut self, class_block: &str, amounts: &Amounts) {
        match Self::slot(class_block) {
            Some(i) => self.buckets[i] += amounts,
            None => tracing::warn!(class_block, "No subtotal bucket for class, amounts not summed"),
        }
    }

    pub fn get(&self, class_block: &str) -> Amounts {
        Self::slot(class_block)
            .map(|i| self.buckets[i])
            .unwrap_or_default()
    }

    pub fn grand_total(&self) -> Amounts {
        let mut total = Amounts::default();
        for bucket in &self.buckets {
            total += bucket;
        }
        total
    }
}
