use std::sync::Arc;

use zarr3_pipeline::prelude::*;
use zarr3_pipeline::ArcArrayD;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let tmp = tempdir::TempDir::new("zarr3-simple")?;

    let stores = StoreRegistry::default();
    let store = stores.open(&StoreConfig::file(
        tmp.path().join("root.zarr"),
        AccessMode::ReadWriteCreate,
    ))?;

    let meta = ArrayMetadataBuilder::<u8>::new(&[4, 4])
        .chunk_grid([2u64, 2].as_slice())?
        .push_bb_codec(GzipCodec::default())
        .build();
    let arr = create_array::<u8, _>(Arc::clone(&store), "my_array", meta)?;
    let everything = ArrayRegion::whole(arr.shape());

    println!("{:?}", arr.read_region(&everything)?);

    let data = ArcArrayD::from_shape_vec(vec![4, 4], (0..16).collect())?;
    arr.write_region(&everything, data.view())?;
    println!("{:?}", arr.read_region(&everything)?);

    // row 0 spans both top chunks, which are merged rather than replaced
    let first_row: Selection = vec![DimSelection::Index(0), DimSelection::Full]
        .into_iter()
        .collect();
    arr.fill_selection(&first_row, 42)?;
    println!("{:?}", arr.read_region(&everything)?);
    Ok(())
}
