//! Tests for header byte order detection and pointer encoding

extern crate std;

use std::io::{Cursor, Seek, SeekFrom};

use super::test_utils::{self, Flavor, TestImage, TestTiffBuilder};
use crate::errors::ScrubError;
use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
use crate::io::redactor::{self, PointerSlot};
use crate::tiff::reader::TiffReader;

fn one_image(flavor: Flavor) -> TestTiffBuilder {
    TestTiffBuilder::new(flavor)
        .image(TestImage::new().description("Aperio Image Library").strips(vec![vec![7; 12]]))
}

#[test]
fn test_header_byte_order_and_layout() {
    let cases = [
        (Flavor::Classic, false, ByteOrder::LittleEndian, false),
        (Flavor::Classic, true, ByteOrder::BigEndian, false),
        (Flavor::BigTiff, false, ByteOrder::LittleEndian, true),
        (Flavor::BigTiff, true, ByteOrder::BigEndian, true),
    ];

    for (flavor, big_endian, order, big_tiff) in cases {
        let builder = if big_endian { one_image(flavor).big_endian() } else { one_image(flavor) };
        let built = builder.build();
        let mut cursor = Cursor::new(built.data);

        let reader = TiffReader::open(&mut cursor).unwrap();
        std::assert_eq!(reader.byte_order(), order, "{:?}", flavor);
        std::assert_eq!(reader.layout().is_big_tiff, big_tiff);
        std::assert_eq!(reader.first_ifd_offset(), built.ifd_offsets[0]);
    }
}

#[test]
fn test_ndpi_header_reads_as_classic_until_first_ifd() {
    let built = TestTiffBuilder::new(Flavor::Ndpi)
        .big_endian()
        .image(TestImage::new().source_lens(-1.0).strips(vec![test_utils::jpeg_payload(8, 0)]))
        .build();
    let mut cursor = Cursor::new(built.data);

    let mut reader = TiffReader::open(&mut cursor).unwrap();
    std::assert_eq!(reader.byte_order(), ByteOrder::BigEndian);
    std::assert!(!reader.layout().is_ndpi);

    reader.read_chain(&mut cursor).unwrap();
    std::assert!(reader.layout().is_ndpi);
    std::assert!(!reader.layout().is_big_tiff);
}

#[test]
fn test_unknown_byte_order_mark() {
    let mut cursor = Cursor::new(vec![0x12, 0x34, 42, 0, 8, 0, 0, 0]);
    std::assert!(matches!(ByteOrder::detect(&mut cursor), Err(ScrubError::InvalidByteOrder(0x3412))));
}

#[test]
fn test_pointer_written_in_file_byte_order() {
    for big_endian in [false, true] {
        let builder = one_image(Flavor::BigTiff);
        let built = if big_endian { builder.big_endian().build() } else { builder.build() };
        let mut cursor = Cursor::new(built.data.clone());

        let reader = TiffReader::open(&mut cursor).unwrap();
        let slot = PointerSlot::new(built.next_slots[0], 8);
        redactor::write_pointer(&mut cursor, reader.handler(), slot, 0x0102_0304_0506).unwrap();

        cursor.seek(SeekFrom::Start(slot.position)).unwrap();
        std::assert_eq!(reader.handler().read_u64(&mut cursor).unwrap(), 0x0102_0304_0506);

        let data = cursor.into_inner();
        std::assert_eq!(test_utils::read_pointer(&data, slot.position, 8, big_endian), 0x0102_0304_0506);
        std::assert_eq!(data.len(), built.data.len());
    }
}

#[test]
fn test_handlers_write_pointers_in_their_byte_order() {
    let mut little = Cursor::new(Vec::new());
    LittleEndianHandler.write_u32(&mut little, 0x0A0B0C0D).unwrap();
    LittleEndianHandler.write_u64(&mut little, 1).unwrap();
    std::assert_eq!(little.into_inner(), vec![0x0D, 0x0C, 0x0B, 0x0A, 1, 0, 0, 0, 0, 0, 0, 0]);

    let mut big = Cursor::new(Vec::new());
    BigEndianHandler.write_u32(&mut big, 0x0A0B0C0D).unwrap();
    std::assert_eq!(big.into_inner(), vec![0x0A, 0x0B, 0x0C, 0x0D]);
}

#[test]
fn test_classic_slot_rejects_wide_offset() {
    let built = one_image(Flavor::Classic).build();
    let mut cursor = Cursor::new(built.data.clone());

    let result = redactor::write_pointer(&mut cursor, &LittleEndianHandler, PointerSlot::new(4, 4), 1 << 32);
    std::assert!(matches!(result, Err(ScrubError::MalformedContainer(_))));
    std::assert_eq!(cursor.into_inner(), built.data);
}

#[test]
fn test_ndpi_source_lens_decodes_in_both_orders() {
    for big_endian in [false, true] {
        let builder = TestTiffBuilder::new(Flavor::Ndpi)
            .image(TestImage::new().source_lens(-1.0).strips(vec![test_utils::jpeg_payload(8, 0)]));
        let built = if big_endian { builder.big_endian().build() } else { builder.build() };
        let mut cursor = Cursor::new(built.data);

        let mut reader = TiffReader::open(&mut cursor).unwrap();
        let tiff = reader.read_chain(&mut cursor).unwrap();
        let lens = reader.read_tag(&mut cursor, &tiff.ifds[0], test_utils::NDPI_SOURCE_LENS).unwrap();
        std::assert_eq!(lens.and_then(|v| v.first_as_f64()), Some(-1.0));
    }
}
