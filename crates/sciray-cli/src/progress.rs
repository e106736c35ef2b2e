use std::fmt::Display;

pub struct PercentBar {
    pub percent: f32,
    pub width: usize,
}

impl Display for PercentBar {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let percent = self.percent.clamp(0.0, 1.0);
        let filled = ((self.width - 1) as f32 * percent).round() as usize;
        write!(
            f,
            "[{empty:=>width_left$}>{empty:.<width_right$}] {percent:.1}%",
            empty = "",
            width_left = filled,
            width_right = self.width - 1 - filled,
            percent = 100. * percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_has_a_fixed_width() {
        for percent in [0.0, 0.33, 1.0, 2.0] {
            let bar = PercentBar { percent, width: 20 }.to_string();
            assert_eq!(bar.find(']'), Some(21));
        }
        assert!(PercentBar { percent: 0.5, width: 11 }
            .to_string()
            .ends_with("50.0%"));
    }
}
