quantity!(Percent, suffix: "%", precision: 1);

impl Percent {
    pub fn from_proportion(proportion: f64) -> Self {
        Self(proportion * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_proportion() {
        assert_eq!(Percent::from_proportion(9.0 / 99.0).to_string(), "9.1 %");
        assert_eq!(Percent::from_proportion(1.0).to_string(), "100.0 %");
    }
}
