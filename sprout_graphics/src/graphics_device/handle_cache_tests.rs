//! Unit tests for handle_cache.rs

use std::cell::Cell;

use crate::error::{Error, Result};
use crate::graphics_device::{Sampler, SamplerCache, TextureAddress};

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn test_equal_descriptions_share_one_handle() {
    let created = Cell::new(0u64);
    let mut cache: SamplerCache<u64> = SamplerCache::new();

    let mut create = |_: &Sampler| -> Result<u64> {
        created.set(created.get() + 1);
        Ok(created.get() * 100)
    };

    let a = cache.get_or_create(&Sampler::LINEAR, &mut create).unwrap();
    let b = cache.get_or_create(&Sampler::LINEAR, &mut create).unwrap();
    let built = Sampler {
        address_u: TextureAddress::Repeat,
        ..Sampler::LINEAR
    };
    let c = cache.get_or_create(&built, &mut create).unwrap();

    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(created.get(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_distinct_descriptions_create_distinct_handles() {
    let created = Cell::new(0u64);
    let mut cache: SamplerCache<u64> = SamplerCache::new();
    let mut create = |_: &Sampler| -> Result<u64> {
        created.set(created.get() + 1);
        Ok(created.get())
    };

    let presets = [
        Sampler::LINEAR,
        Sampler::POINT,
        Sampler::LINEAR_CLAMP,
        Sampler::POINT_CLAMP,
    ];
    let handles: Vec<u64> = presets
        .iter()
        .map(|s| cache.get_or_create(s, &mut create).unwrap())
        .collect();

    assert_eq!(handles, vec![1, 2, 3, 4]);
    for (preset, handle) in presets.iter().zip(&handles) {
        assert_eq!(cache.get_or_create(preset, &mut create).unwrap(), *handle);
    }
    assert_eq!(created.get(), 4);
}

#[test]
fn test_failed_creation_is_not_cached() {
    let mut cache: SamplerCache<u64> = SamplerCache::new();
    let result = cache.get_or_create(&Sampler::POINT, |_| Err(Error::OutOfMemory));
    assert_eq!(result, Err(Error::OutOfMemory));
    assert!(cache.is_empty());

    assert_eq!(cache.get_or_create(&Sampler::POINT, |_| Ok(7)).unwrap(), 7);
    assert_eq!(cache.get(&Sampler::POINT), Some(&7));
}

#[test]
fn test_drain_returns_every_handle() {
    let mut cache: SamplerCache<u64> = SamplerCache::new();
    cache.get_or_create(&Sampler::POINT, |_| Ok(1)).unwrap();
    cache.get_or_create(&Sampler::LINEAR, |_| Ok(2)).unwrap();

    let mut drained: Vec<u64> = cache.drain().map(|(_, h)| h).collect();
    drained.sort();
    assert_eq!(drained, vec![1, 2]);
    assert!(cache.is_empty());
}
