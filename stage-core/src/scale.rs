//! Viewport fit scale.

/// Scale that fits `content` inside `container` without ever upscaling.
///
/// Returns `min(container_w / content_w, container_h / content_h, 1)`. A zero,
/// negative or non-finite content dimension yields `0.0`, and negative
/// container dimensions are treated as zero.
#[must_use]
pub fn compute_fit_scale(
    content_w: f64,
    content_h: f64,
    container_w: f64,
    container_h: f64,
) -> f64 {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(content_w) || !valid(content_h) {
        return 0.0;
    }
    let container_w = container_w.max(0.0);
    let container_h = container_h.max(0.0);

    (container_w / content_w).min(container_h / content_h).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_narrow_container() {
        let scale = compute_fit_scale(512.0, 512.0, 300.0, 600.0);
        assert!((scale - 300.0 / 512.0).abs() < 1e-12);
        assert!((512.0 * scale - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_upscales() {
        assert!((compute_fit_scale(512.0, 512.0, 2048.0, 4096.0) - 1.0).abs() < f64::EPSILON);
        assert!((compute_fit_scale(100.0, 50.0, 100.0, 50.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_content_is_zero_scale() {
        assert!(compute_fit_scale(0.0, 512.0, 300.0, 300.0).abs() < f64::EPSILON);
        assert!(compute_fit_scale(512.0, 0.0, 300.0, 300.0).abs() < f64::EPSILON);
        assert!(compute_fit_scale(f64::NAN, 512.0, 300.0, 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounded_by_both_ratios() {
        let dims = [
            (512.0, 512.0, 300.0, 600.0),
            (1024.0, 768.0, 640.0, 480.0),
            (768.0, 1024.0, 1920.0, 300.0),
            (64.0, 64.0, 1.0, 1000.0),
            (1.0, 1.0, 0.0, 0.0),
        ];
        for (cw, ch, w, h) in dims {
            let scale = compute_fit_scale(cw, ch, w, h);
            assert!(scale <= 1.0);
            assert!(scale <= (w / cw).min(h / ch) + 1e-12);
            assert!(scale >= 0.0);
        }
    }

    #[test]
    fn test_negative_container_clamps() {
        assert!(compute_fit_scale(100.0, 100.0, -50.0, 100.0).abs() < f64::EPSILON);
    }
}
