#![cfg(feature = "gdal")]

use gdal_rasterio::cpl::CslStringList;
use gdal_rasterio::errors::Result;
use gdal_rasterio::raster::{GdalDataType, MemDataset, RasterIo, RasterStore, Window};
use gdal_rasterio::Driver;

#[test]
fn test_get_driver() {
    let driver = Driver::get_by_name("GTiff").unwrap();
    assert_eq!(driver.short_name(), "GTiff");
    assert!(Driver::get_by_name("NOT_A_DRIVER").is_err());
}

#[test]
fn test_mem_dataset_to_gdal_and_back() -> Result<()> {
    let mut src = MemDataset::new((20, 10), 2, GdalDataType::UInt16);
    let data: Vec<u16> = (0..400).collect();
    src.basic_write(
        Window::full(src.raster_size()),
        &[1, 2],
        bytemuck::cast_slice(&data),
    )?;

    let mut gdal_ds = Driver::get_by_name("MEM")?.create("", (20, 10), 2, GdalDataType::UInt16)?;
    src.copy_whole_raster(&mut gdal_ds, &CslStringList::new(), None)?;

    let mut back = MemDataset::new((20, 10), 2, GdalDataType::UInt16);
    gdal_ds.copy_whole_raster(&mut back, &CslStringList::new(), None)?;

    let read: Vec<u16> = back.read_as(Window::new(0, 0, 20, 10), &[1, 2], (20, 10))?;
    assert_eq!(read, data);
    Ok(())
}
