//! Tests for the TIFF types module

extern crate std;

use crate::io::byte_order::ByteOrder;
use crate::io::redactor::PointerSlot;
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::{TagValue, TiffLayout, TIFF};

#[test]
fn test_tiff_creation() {
    let tiff = TIFF::new(ByteOrder::LittleEndian, TiffLayout::classic());
    std::assert!(!tiff.layout.is_big_tiff);
    std::assert_eq!(tiff.ifd_count(), 0);
    std::assert!(tiff.ifds.is_empty());
}

#[test]
fn test_tiff_with_ifds() {
    let mut tiff = TIFF::new(ByteOrder::BigEndian, TiffLayout::big_tiff());

    let mut main_ifd = IFD::new(0, 16, PointerSlot::new(8, 8));
    main_ifd.add_entry(IFDEntry::new(256, 4, 1, 1024, 24));
    main_ifd.add_entry(IFDEntry::new(257, 4, 1, 768, 44));
    tiff.ifds.push(main_ifd);

    let mut label_ifd = IFD::new(1, 100, PointerSlot::new(64, 8));
    label_ifd.add_entry(IFDEntry::new(254, 4, 1, 1, 108));
    tiff.ifds.push(label_ifd);

    std::assert!(tiff.layout.is_big_tiff);
    std::assert_eq!(tiff.ifd_count(), 2);
    std::assert_eq!(tiff.ifd_offsets(), vec![16, 100]);
    std::assert_eq!(tiff.ifds[0].get_entry(256).map(|e| e.value_offset), Some(1024));
    std::assert!(tiff.ifds[1].is_last());
}

#[test]
fn test_first_duplicate_tag_wins() {
    let mut ifd = IFD::new(0, 8, PointerSlot::new(4, 4));
    ifd.add_entry(IFDEntry::new(270, 2, 6, 100, 10));
    ifd.add_entry(IFDEntry::new(270, 2, 9, 200, 22));

    std::assert_eq!(ifd.entry_count(), 2);
    std::assert_eq!(ifd.get_entry(270).map(|e| e.value_offset), Some(100));
}

#[test]
fn test_layout_sizes() {
    let classic = TiffLayout::classic();
    std::assert_eq!(classic.entry_size(), 12);
    std::assert_eq!(classic.next_pointer_width(), 4);
    std::assert_eq!(classic.header_slot(), PointerSlot::new(4, 4));

    let big = TiffLayout::big_tiff();
    std::assert_eq!(big.entry_size(), 20);
    std::assert_eq!(big.header_slot(), PointerSlot::new(8, 8));

    let ndpi = TiffLayout { is_big_tiff: false, is_ndpi: true };
    std::assert_eq!(ndpi.entry_size(), 12);
    std::assert_eq!(ndpi.value_field_size(), 4);
    std::assert_eq!(ndpi.next_pointer_width(), 8);
    std::assert_eq!(ndpi.header_slot(), PointerSlot::new(4, 4));
}

#[test]
fn test_tag_value_accessors() {
    let lens = TagValue::Float(vec![-1.0]);
    std::assert_eq!(lens.first_as_f64(), Some(-1.0));
    std::assert!(lens.as_bytes().is_none());

    let text = TagValue::Ascii(b"label 10x10".to_vec());
    std::assert_eq!(text.as_bytes(), Some(&b"label 10x10"[..]));
    std::assert_eq!(text.first_as_f64(), None);

    std::assert_eq!(TagValue::Unsigned(Vec::new()).first_as_f64(), None);
}

#[test]
fn test_entry_inline_capacity() {
    let short_pair = IFDEntry::new(258, 3, 2, 0, 0);
    std::assert!(short_pair.is_value_inline(4));

    let five_longs = IFDEntry::new(273, 4, 5, 0, 0);
    std::assert_eq!(five_longs.value_byte_size(), Some(20));
    std::assert!(!five_longs.is_value_inline(8));

    let unknown = IFDEntry::new(1, 99, 1, 0, 0);
    std::assert!(!unknown.is_value_inline(8));
}
