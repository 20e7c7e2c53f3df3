//! Dimension Resolver
//!
//! Maps an arbitrary requested size onto the closest descriptor each provider
//! accepts. Everything here is pure: same input, same descriptor.

use log::trace;

use super::types::{Dimension, ProviderDescriptor, RatioEntry, Vocabulary};
use crate::error_handling::types::ResolveError;

/// Aspect-ratio tags accepted by the image-editing reframe model, in
/// declaration order (which decides ties).
pub fn image_editing_vocabulary() -> Vocabulary {
    Vocabulary::Nearest(vec![
        RatioEntry::new(21.0 / 9.0, "21:9"),
        RatioEntry::new(16.0 / 9.0, "16:9"),
        RatioEntry::new(4.0 / 3.0, "4:3"),
        RatioEntry::new(3.0 / 2.0, "3:2"),
        RatioEntry::new(1.0, "1:1"),
        RatioEntry::new(2.0 / 3.0, "2:3"),
        RatioEntry::new(3.0 / 4.0, "3:4"),
        RatioEntry::new(9.0 / 16.0, "9:16"),
        RatioEntry::new(9.0 / 21.0, "9:21"),
    ])
}

/// Sized presets accepted by the ideogram reframe model.
pub fn ideogram_vocabulary() -> Vocabulary {
    Vocabulary::bucketed(
        vec![
            RatioEntry::new(1.5, "landscape_16_9"),
            RatioEntry::new(1.1, "landscape_4_3"),
            RatioEntry::new(0.9, "square_hd"),
            RatioEntry::new(0.6, "portrait_3_4"),
        ],
        "portrait_9_16",
    )
}

/// Resolves `dimension` against `vocabulary`.
pub fn resolve_descriptor(
    dimension: &Dimension,
    vocabulary: &Vocabulary,
) -> Result<ProviderDescriptor, ResolveError> {
    let ratio = dimension.ratio()?;
    resolve_ratio(ratio, vocabulary)
}

/// Resolves a raw width/height ratio against `vocabulary`.
pub fn resolve_ratio(
    ratio: f64,
    vocabulary: &Vocabulary,
) -> Result<ProviderDescriptor, ResolveError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(ResolveError::InvalidDimension(format!(
            "ratio {} is not a positive finite number",
            ratio
        )));
    }

    let descriptor = match vocabulary {
        Vocabulary::Nearest(entries) => {
            let mut iter = entries.iter();
            let mut closest = iter.next().ok_or(ResolveError::EmptyVocabulary)?;
            let mut min_diff = (ratio - closest.ratio).abs();
            for entry in iter {
                let diff = (ratio - entry.ratio).abs();
                // strict: the earlier entry keeps a tie
                if diff < min_diff {
                    min_diff = diff;
                    closest = entry;
                }
            }
            closest.descriptor.clone()
        }
        Vocabulary::Bucketed {
            thresholds,
            fallback,
        } => {
            // largest bound strictly exceeded, independent of stored order
            let mut best: Option<&RatioEntry> = None;
            for entry in thresholds.iter().filter(|entry| ratio > entry.ratio) {
                if best.map_or(true, |b| entry.ratio > b.ratio) {
                    best = Some(entry);
                }
            }
            best.map(|entry| entry.descriptor.clone())
                .unwrap_or_else(|| fallback.clone())
        }
    };

    trace!("Resolved ratio {:.4} to {}", ratio, descriptor);
    Ok(descriptor)
}

/// Resolves one descriptor per provider: (image-editing, ideogram).
pub fn resolve_pair(
    dimension: &Dimension,
) -> Result<(ProviderDescriptor, ProviderDescriptor), ResolveError> {
    let a = resolve_descriptor(dimension, &image_editing_vocabulary())?;
    let b = resolve_descriptor(dimension, &ideogram_vocabulary())?;
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_wide() -> Vocabulary {
        Vocabulary::nearest(vec![
            RatioEntry::new(1.0, "square"),
            RatioEntry::new(1.78, "wide"),
        ])
        .unwrap()
    }

    fn tag(d: Dimension, v: &Vocabulary) -> String {
        resolve_descriptor(&d, v).unwrap().as_str().to_string()
    }

    #[test]
    fn test_square_wide_scenario() {
        let v = square_wide();
        assert_eq!(tag(Dimension::new(1024, 1024), &v), "square");
        assert_eq!(tag(Dimension::new(1920, 1080), &v), "wide");
        assert_eq!(tag(Dimension::new(1000, 900), &v), "square");
    }

    #[test]
    fn test_exact_ratio_selects_entry() {
        let v = image_editing_vocabulary();
        assert_eq!(tag(Dimension::new(1920, 1080), &v), "16:9");
        assert_eq!(tag(Dimension::new(1080, 1920), &v), "9:16");
        assert_eq!(tag(Dimension::new(1024, 768), &v), "4:3");
        assert_eq!(tag(Dimension::new(768, 1024), &v), "3:4");
        assert_eq!(tag(Dimension::new(1500, 1000), &v), "3:2");
        assert_eq!(tag(Dimension::new(2100, 900), &v), "21:9");
        assert_eq!(tag(Dimension::new(900, 2100), &v), "9:21");
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        // 1.5 sits exactly between 1.0 and 2.0
        let v = Vocabulary::nearest(vec![
            RatioEntry::new(2.0, "first"),
            RatioEntry::new(1.0, "second"),
        ])
        .unwrap();
        assert_eq!(tag(Dimension::new(3, 2), &v), "first");

        let reversed = Vocabulary::nearest(vec![
            RatioEntry::new(1.0, "second"),
            RatioEntry::new(2.0, "first"),
        ])
        .unwrap();
        assert_eq!(tag(Dimension::new(3, 2), &reversed), "second");
    }

    #[test]
    fn test_ideogram_buckets() {
        let v = ideogram_vocabulary();
        assert_eq!(tag(Dimension::new(1920, 1080), &v), "landscape_16_9");
        assert_eq!(tag(Dimension::new(1920, 820), &v), "landscape_16_9");
        assert_eq!(tag(Dimension::new(1024, 768), &v), "landscape_4_3");
        assert_eq!(tag(Dimension::new(1024, 1024), &v), "square_hd");
        assert_eq!(tag(Dimension::new(768, 1024), &v), "portrait_3_4");
        assert_eq!(tag(Dimension::new(1080, 1920), &v), "portrait_9_16");
    }

    #[test]
    fn test_bucket_bounds_are_exclusive() {
        let v = ideogram_vocabulary();
        // exactly 1.5 does not exceed the 16:9 bound
        assert_eq!(tag(Dimension::new(3, 2), &v), "landscape_4_3");
        // exactly 0.6 falls through to the catch-all
        assert_eq!(tag(Dimension::new(3, 5), &v), "portrait_9_16");
    }

    #[test]
    fn test_unsorted_thresholds_built_directly() {
        let v = Vocabulary::Bucketed {
            thresholds: vec![
                RatioEntry::new(0.6, "portrait_3_4"),
                RatioEntry::new(1.5, "landscape_16_9"),
                RatioEntry::new(1.1, "landscape_4_3"),
            ],
            fallback: ProviderDescriptor::new("portrait_9_16"),
        };
        let resolve = |r: f64| resolve_ratio(r, &v).unwrap().as_str().to_string();
        assert_eq!(resolve(2.0), "landscape_16_9");
        assert_eq!(resolve(1.3), "landscape_4_3");
        assert_eq!(resolve(0.8), "portrait_3_4");
        assert_eq!(resolve(0.5), "portrait_9_16");
    }

    #[test]
    fn test_result_is_always_in_vocabulary() {
        let vocabularies = [image_editing_vocabulary(), ideogram_vocabulary(), square_wide()];
        let sizes = [1u32, 2, 3, 7, 64, 100, 333, 768, 1024, 1080, 1920, 4096, 65535];
        for v in &vocabularies {
            for &w in &sizes {
                for &h in &sizes {
                    let d = resolve_descriptor(&Dimension::new(w, h), v).unwrap();
                    assert!(v.contains(&d), "{} not in vocabulary for {}x{}", d, w, h);
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let v = image_editing_vocabulary();
        let d = Dimension::new(1234, 567);
        assert_eq!(
            resolve_descriptor(&d, &v).unwrap(),
            resolve_descriptor(&d, &v).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let v = image_editing_vocabulary();
        assert!(matches!(
            resolve_descriptor(&Dimension::new(0, 1024), &v),
            Err(ResolveError::InvalidDimension(_))
        ));
        assert!(matches!(
            resolve_ratio(f64::NAN, &v),
            Err(ResolveError::InvalidDimension(_))
        ));
        assert!(matches!(
            resolve_ratio(f64::INFINITY, &v),
            Err(ResolveError::InvalidDimension(_))
        ));
        assert!(matches!(
            resolve_ratio(-1.0, &v),
            Err(ResolveError::InvalidDimension(_))
        ));
        assert_eq!(
            resolve_ratio(1.0, &Vocabulary::Nearest(vec![])),
            Err(ResolveError::EmptyVocabulary)
        );
    }

    #[test]
    fn test_resolve_pair() {
        let (a, b) = resolve_pair(&Dimension::new(1920, 1080)).unwrap();
        assert_eq!(a.as_str(), "16:9");
        assert_eq!(b.as_str(), "landscape_16_9");
    }
}
