//! # BigArray Behaviour Across Backings
//!
//! Runs the same scenario against every width on each backing:
//!
//! 1. **Resident**: typed vector in memory
//! 2. **Paged**: temporary file, freshly allocated page buffers
//! 3. **Paged + pool**: temporary file, page buffers from a shared `BufferPool`
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test big_array
//! ```

use bigarray::{for_each, reverse_for_each, ArrayConfig, ArrayError, BigArray, BufferPool, Width};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn scenario_config(width: Width) -> ArrayConfig {
    ArrayConfig::new(64).with_width(width).with_page_size(32)
}

fn run_basic_scenario(config: ArrayConfig) {
    let array = BigArray::open(config).expect("Failed to open array");
    assert_eq!(array.len(), 64);

    assert_eq!(array.value_at(42).unwrap(), 0);
    array.set_value_at(42, 0xCC).unwrap();
    assert_eq!(array.value_at(42).unwrap(), 0xCC);
    assert_eq!(array.value_at(43).unwrap(), 0);
    assert_eq!(array.value_at(41).unwrap(), 0);
    array.value_at(0).unwrap();
    array.value_at(63).unwrap();

    let err = array.value_at(64).unwrap_err();
    assert!(ArrayError::is_out_of_range(&err));

    {
        let mut iter = array.iterate(0, array.len());
        let mut n = 0;
        while iter.advance() {
            let index = iter.index();
            assert_eq!(index, n, "ascending iteration out of order");
            iter.set_value(index);
            n += 1;
        }
        iter.close().expect("Failed to close ascending iterator");
        assert_eq!(n, array.len());
    }

    {
        let mut iter = array.reverse_iterate(0, array.len());
        let mut n = 0;
        while iter.advance() {
            n += 1;
            let expected = array.len() - n;
            assert_eq!(iter.index(), expected, "descending iteration out of order");
            assert_eq!(iter.value(), expected);
        }
        iter.close().expect("Failed to close descending iterator");
        assert_eq!(n, array.len());
    }

    for i in 0..array.len() {
        array.set_value_at(i, 0).unwrap();
    }
    for i in 0..array.len() {
        assert_eq!(array.value_at(i).unwrap(), 0, "index {} not cleared", i);
    }

    array.close().expect("Failed to close array");
}

fn paged(len: u64, width: Width, page_size: usize) -> BigArray {
    BigArray::open(
        ArrayConfig::new(len)
            .with_width(width)
            .with_disk_threshold(0)
            .with_page_size(page_size),
    )
    .expect("Failed to open paged array")
}

// ============================================================================
// SCENARIO ACROSS BACKINGS
// ============================================================================

#[test]
fn resident_all_widths() {
    for width in Width::ALL {
        run_basic_scenario(scenario_config(width));
    }
}

#[test]
fn paged_without_pool_all_widths() {
    for width in Width::ALL {
        run_basic_scenario(scenario_config(width).with_disk_threshold(0));
    }
}

#[test]
fn paged_with_pool_all_widths() {
    let pool = BufferPool::new(64, 0);
    for width in Width::ALL {
        run_basic_scenario(
            scenario_config(width)
                .with_disk_threshold(0)
                .with_pool(pool.clone()),
        );
    }
    assert!(pool.available() > 0, "page buffers were not returned to the pool");
}

#[test]
fn width_chosen_from_bound() {
    let array = BigArray::open(ArrayConfig::new(64).with_max_value(255)).unwrap();
    assert_eq!(array.width(), Width::One);
    assert_eq!(array.max_value(), 255);
}

// ============================================================================
// ROUND TRIPS AND PAGE BOUNDARIES
// ============================================================================

#[test]
fn adjacent_writes_across_page_boundary() {
    for width in Width::ALL {
        let array = paged(24, width, 16);
        let per_page = 16 / width.bytes() as u64;
        let bound = width.bound();

        array.set_value_at(per_page - 1, bound).unwrap();
        array.set_value_at(per_page, bound - 1).unwrap();

        assert_eq!(array.value_at(per_page - 1).unwrap(), bound);
        assert_eq!(array.value_at(per_page).unwrap(), bound - 1);
        if per_page >= 2 {
            assert_eq!(array.value_at(per_page - 2).unwrap(), 0);
        }
        assert_eq!(array.value_at(per_page + 1).unwrap(), 0);
    }
}

#[test]
fn sub_range_cursors_on_both_backings() {
    let resident = BigArray::open(ArrayConfig::new(50).with_max_value(255)).unwrap();
    let disk = paged(50, Width::One, 8);
    for array in [&resident, &disk] {
        for i in 0..50 {
            array.set_value_at(i, i).unwrap();
        }

        let mut iter = array.iterate(10, 30);
        let mut seen = Vec::new();
        while iter.skip(4) {
            seen.push(iter.value());
        }
        iter.close().unwrap();
        assert_eq!(seen, vec![13, 17, 21, 25, 29]);

        let mut iter = array.reverse_iterate(10, 30);
        let mut seen = Vec::new();
        while iter.skip(5) {
            seen.push(iter.value());
        }
        iter.close().unwrap();
        assert_eq!(seen, vec![25, 20, 15, 10]);
    }
}

#[test]
fn empty_range_visits_nothing() {
    let array = paged(8, Width::Two, 8);
    let mut iter = array.iterate(4, 4);
    assert!(!iter.advance());
    assert!(iter.err().is_none());
    iter.close().unwrap();
}

// ============================================================================
// TRUNCATE AND FREEZE
// ============================================================================

#[test]
fn truncate_preserves_prefix() {
    for mut array in [
        BigArray::open(ArrayConfig::new(32).with_width(Width::Four)).unwrap(),
        paged(32, Width::Four, 16),
    ] {
        for i in 0..32 {
            array.set_value_at(i, i * 1000).unwrap();
        }
        array.truncate(10).unwrap();
        assert_eq!(array.len(), 10);
        for i in 0..10 {
            assert_eq!(array.value_at(i).unwrap(), i * 1000);
        }
        assert!(ArrayError::is_out_of_range(&array.value_at(10).unwrap_err()));
        array.close().unwrap();
    }
}

#[test]
#[should_panic(expected = "cannot grow")]
fn truncate_rejects_growth() {
    let mut array = paged(4, Width::One, 8);
    let _ = array.truncate(5);
}

#[test]
fn frozen_array_still_reads() {
    let mut array = paged(16, Width::Two, 8);
    array.set_value_at(3, 300).unwrap();
    array.freeze().unwrap();
    assert!(array.is_frozen());
    assert_eq!(array.value_at(3).unwrap(), 300);

    let mut sum = 0;
    for_each(&array, |_, v| {
        sum += v;
        Ok(())
    })
    .unwrap();
    assert_eq!(sum, 300);
}

#[test]
#[should_panic(expected = "read-only")]
fn frozen_array_rejects_direct_writes() {
    let mut array = BigArray::open(ArrayConfig::new(4).with_max_value(9)).unwrap();
    array.freeze().unwrap();
    let _ = array.set_value_at(0, 1);
}

#[test]
#[should_panic(expected = "read-only")]
fn frozen_array_rejects_cursor_writes() {
    let mut array = paged(4, Width::One, 8);
    array.freeze().unwrap();
    let mut iter = array.iterate(0, 4);
    iter.advance();
    iter.set_value(1);
}

#[test]
#[should_panic(expected = "value out of range")]
fn cursor_write_above_bound_panics() {
    let array = BigArray::open(
        ArrayConfig::new(4)
            .with_max_value(10)
            .with_disk_threshold(0)
            .with_page_size(8),
    )
    .unwrap();
    let mut iter = array.iterate(0, 4);
    iter.advance();
    iter.set_value(11);
}

// ============================================================================
// COPY AND TRAVERSAL
// ============================================================================

#[test]
fn copy_between_every_backing_and_width() {
    let sources = [
        BigArray::open(ArrayConfig::new(40).with_width(Width::Two)).unwrap(),
        paged(40, Width::Two, 16),
    ];
    for src in &sources {
        for i in 0..40 {
            src.set_value_at(i, (i * 7) % 200).unwrap();
        }
    }

    for src in &sources {
        for width in Width::ALL {
            for disk in [false, true] {
                let mut config = ArrayConfig::new(40).with_width(width).with_page_size(24);
                if disk {
                    config = config.with_disk_threshold(0);
                }
                let mut dst = BigArray::open(config).unwrap();
                dst.copy_from(src).unwrap();
                for i in 0..40 {
                    assert_eq!(dst.value_at(i).unwrap(), src.value_at(i).unwrap());
                }
                dst.close().unwrap();
            }
        }
    }
}

#[test]
fn reverse_for_each_sees_every_index() {
    let array = paged(10, Width::Eight, 16);
    let mut seen = Vec::new();
    reverse_for_each(&array, |i, v| {
        assert_eq!(v, 0);
        seen.push(i);
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, (0..10).rev().collect::<Vec<_>>());
}

// ============================================================================
// ITERATOR LIFECYCLE
// ============================================================================

#[test]
fn second_close_reports_already_closed() {
    for array in [
        BigArray::open(ArrayConfig::new(4).with_max_value(9)).unwrap(),
        paged(4, Width::One, 8),
    ] {
        let mut iter = array.iterate(0, 4);
        assert!(iter.advance());
        iter.close().unwrap();
        assert!(iter.is_closed());

        let err = iter.close().unwrap_err();
        assert!(ArrayError::is_closed_iterator(&err));
        assert!(!iter.advance());
    }
}

#[test]
fn array_usable_after_cursor_dropped() {
    for mut array in [
        BigArray::open(ArrayConfig::new(8).with_max_value(255)).unwrap(),
        paged(8, Width::One, 8),
    ] {
        {
            let mut iter = array.iterate(0, 8);
            while iter.advance() {
                let i = iter.index();
                iter.set_value(i);
            }
            iter.close().expect("Failed to close writer");
        }
        array.truncate(4).expect("Failed to truncate");

        let mut iter = array.reverse_iterate(0, 4);
        assert!(iter.advance());
        assert_eq!(iter.value(), 3);
        iter.close().expect("Failed to close reader");
        drop(iter);
        array.close().expect("Failed to close array");
    }
}

#[test]
#[should_panic(expected = "must advance before skip(0)")]
fn skip_zero_before_advance_panics() {
    let array = paged(4, Width::One, 8);
    let mut iter = array.iterate(0, 4);
    iter.skip(0);
}

#[test]
#[should_panic(expected = "inverted")]
fn inverted_range_panics() {
    let array = BigArray::open(ArrayConfig::new(4).with_max_value(9)).unwrap();
    let _ = array.reverse_iterate(3, 2);
}
