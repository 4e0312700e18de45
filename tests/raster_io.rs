use std::sync::Mutex;

use gdal_rasterio::cpl::CslStringList;
use gdal_rasterio::errors::{GdalError, Result};
use gdal_rasterio::raster::{
    BufferLayout, BufferMut, GdalDataType, MemDataset, RasterIo, RasterStore, StridedRequest,
    Transfer, Window,
};

/// A single-band UInt8 store that records every request the engine hands it.
struct RecordingStore {
    size: (usize, usize),
    pixels: Vec<u8>,
    seen: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new(size: (usize, usize)) -> Self {
        RecordingStore {
            size,
            pixels: (0..size.0 * size.1).map(|i| (i % 251) as u8).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, what: String) {
        self.seen.lock().unwrap().push(what);
    }
}

impl RasterStore for RecordingStore {
    fn raster_size(&self) -> (usize, usize) {
        self.size
    }

    fn raster_count(&self) -> usize {
        1
    }

    fn band_type(&self, band_index: usize) -> Result<GdalDataType> {
        match band_index {
            1 => Ok(GdalDataType::UInt8),
            _ => Err(GdalError::BadArgument(format!("no band {band_index}"))),
        }
    }

    fn read_strided(&self, request: &StridedRequest<'_>, buffer: &mut [u8]) -> Result<()> {
        self.record(format!(
            "read {:?} as {} into {:?}",
            request.window, request.data_type, request.buffer_size
        ));
        request.check_buffer(buffer.len())?;
        let w = request.window;
        for row in 0..w.height {
            for col in 0..w.width {
                let src = (w.y_off + row) * self.size.0 + w.x_off + col;
                buffer[request.offset(0, col, row)] = self.pixels[src];
            }
        }
        Ok(())
    }

    fn write_strided(&mut self, request: &StridedRequest<'_>, buffer: &[u8]) -> Result<()> {
        self.record(format!("write {:?}", request.window));
        request.check_buffer(buffer.len())?;
        let w = request.window;
        for row in 0..w.height {
            for col in 0..w.width {
                let dst = (w.y_off + row) * self.size.0 + w.x_off + col;
                self.pixels[dst] = buffer[request.offset(0, col, row)];
            }
        }
        Ok(())
    }

    fn advise_read(
        &self,
        window: Window,
        _buffer_size: (usize, usize),
        _data_type: GdalDataType,
        _bands: &[usize],
        _options: &CslStringList,
    ) -> Result<()> {
        self.record(format!("advise {window:?}"));
        Err(GdalError::BadArgument("advice not wanted".to_string()))
    }
}

#[test]
fn test_engine_drives_custom_store() -> Result<()> {
    let mut store = RecordingStore::new((8, 4));
    let window = Window::new(2, 1, 3, 2);

    let mut buf = vec![0u8; 6];
    store.basic_read(window, &[1], &mut buf)?;
    assert_eq!(buf, vec![10, 11, 12, 18, 19, 20]);

    store.basic_write(window, &[1], &[1, 2, 3, 4, 5, 6])?;
    assert_eq!(&store.pixels[10..13], &[1, 2, 3]);
    assert_eq!(&store.pixels[18..21], &[4, 5, 6]);

    let seen = store.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].starts_with("read"));
    assert!(seen[0].contains("UInt8"));
    assert!(seen[1].starts_with("write"));
    Ok(())
}

#[test]
fn test_caller_errors_never_reach_the_store() {
    let store = RecordingStore::new((8, 4));
    let mut buf = vec![0u8; 64];

    let empty_bands: &[usize] = &[];
    assert!(matches!(
        store.basic_read(Window::new(0, 0, 2, 2), empty_bands, &mut buf),
        Err(GdalError::BadArgument(_))
    ));
    assert!(matches!(
        store.basic_read(Window::new(0, 0, 2, 2), &[0], &mut buf),
        Err(GdalError::BadArgument(_))
    ));
    assert!(matches!(
        store.basic_read(Window::new(0, 0, 0, 2), &[1], &mut buf),
        Err(GdalError::BadArgument(_))
    ));
    assert!(matches!(
        store.basic_read(Window::new(0, 0, 2, 2), &[2], &mut buf),
        Err(GdalError::BadArgument(_))
    ));
    assert!(matches!(
        RasterIo::advise_read(
            &store,
            Window::new(0, 0, 2, 2),
            None,
            Some(GdalDataType::UInt8),
            &[2],
            &CslStringList::new(),
        ),
        Err(GdalError::BadArgument(_))
    ));
    assert!(store.seen.lock().unwrap().is_empty());
}

#[test]
fn test_advise_read_ignores_store_failure() {
    let store = RecordingStore::new((8, 4));
    let advised = RasterIo::advise_read(
        &store,
        Window::new(0, 0, 8, 4),
        None,
        None,
        &[1],
        &CslStringList::new(),
    );
    assert!(advised.is_ok());
    assert_eq!(store.seen.lock().unwrap().len(), 1);
}

#[test]
fn test_copy_between_store_kinds() -> Result<()> {
    let src = RecordingStore::new((8, 4));
    let mut dst = MemDataset::new((8, 4), 1, GdalDataType::UInt8);

    let mut fractions = Vec::new();
    let mut progress = |f: f64, _msg: &str| {
        fractions.push(f);
        true
    };
    src.copy_whole_raster(&mut dst, &CslStringList::new(), Some(&mut progress))?;

    // one scanline per chunk
    assert_eq!(fractions.len(), 5);
    assert_eq!(fractions.first(), Some(&0.0));
    assert_eq!(fractions.last(), Some(&1.0));
    assert_eq!(dst.band_bytes(1)?, src.pixels.as_slice());
    Ok(())
}

#[test]
fn test_typed_transfer_through_mem_dataset() -> Result<()> {
    let mut ds = MemDataset::new((4, 2), 2, GdalDataType::Int16);
    let window = Window::full(ds.raster_size());

    let values: Vec<f32> = (0..16).map(|v| v as f32 - 8.5).collect();
    ds.transfer(
        Transfer::Write(values.as_slice().into()),
        window,
        &[1, 2],
        BufferLayout::packed(),
    )?;

    let mut back = vec![0i32; 16];
    ds.transfer(
        Transfer::Read(BufferMut::Int32(&mut back)),
        window,
        &[1, 2],
        BufferLayout::packed(),
    )?;
    // float to integer conversion rounds to nearest
    assert_eq!(back[0], -9);
    assert_eq!(back[15], 7);
    Ok(())
}

#[test]
fn test_layout_type_disagreeing_with_buffer() {
    let ds = MemDataset::new((4, 4), 1, GdalDataType::UInt8);
    let mut out = vec![0f64; 16];
    let err = ds
        .read_window(
            Window::full(ds.raster_size()),
            &[1],
            BufferLayout::packed().with_data_type(GdalDataType::Float32),
            BufferMut::Float64(&mut out),
        )
        .unwrap_err();
    assert!(matches!(err, GdalError::DataTypeMismatch { .. }));
}
