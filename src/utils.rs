//! Utility functions.

/// Size of a page, both in the file and in physical memory.
pub const PAGE_SIZE: u64 = 0x1000;

/// Aligns an address down to the previous multiple of `align`.
/// `align` must be a power of two.
pub fn align_down(addr: u64, align: u64) -> u64 {
    assert!(align.is_power_of_two());
    addr & !(align - 1)
}

/// Offset of `addr` inside its page.
pub fn page_offset(addr: u64) -> u64 {
    addr & (PAGE_SIZE - 1)
}
