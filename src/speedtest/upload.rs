use super::round2;

/// Upload figure derived from the download rate.
///
/// No upload traffic is sent: the figure is `download_mbps * ratio`, rounded
/// to two decimals, with a ratio of 0.3 by default.
pub fn estimate_upload(download_mbps: f64, ratio: f64) -> f64 {
    round2(download_mbps * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn estimate_is_three_tenths_to_the_cent(download in 0.0f64..100_000.0) {
            let upload = estimate_upload(download, 0.3);
            prop_assert!(upload >= 0.0);
            prop_assert!((upload - download * 0.3).abs() <= 0.005 + 1e-9);
            let cents = upload * 100.0;
            prop_assert!((cents - cents.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_estimate_is_fixed_fraction_of_download() {
        assert_eq!(estimate_upload(45.67, 0.3), 13.7);
        assert_eq!(format!("{:.2}", estimate_upload(45.67, 0.3)), "13.70");
        assert_eq!(estimate_upload(100.0, 0.3), 30.0);
    }

    #[test]
    fn test_zero_download_estimates_zero() {
        assert_eq!(estimate_upload(0.0, 0.3), 0.0);
        assert_eq!(format!("{:.2}", estimate_upload(0.0, 0.3)), "0.00");
    }
}
