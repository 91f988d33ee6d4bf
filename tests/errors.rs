//! Integration tests for failure modes and lifecycle ordering.

use meshio::prelude::*;
use tempfile::TempDir;

const NO_LOOKUP_TABLE: &str = "# vtk DataFile Version 3.0\nbroken scalars\nASCII\nDATASET POLYDATA\n\
    POINTS 3 float\n0 0 0 1 0 0 0 1 0\n\
    POLYGONS 1 4\n3 0 1 2\n\
    POINT_DATA 3\n\
    SCALARS s float\n\
    1 2 3\n";

#[test]
fn test_missing_lookup_table_keeps_geometry() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("broken.vtk");
    std::fs::write(&path, NO_LOOKUP_TABLE)?;

    let mut io = VtkPolyDataMeshIO::new();
    io.set_file_name(&path);
    io.read_mesh_information()?;
    let info = io.info().clone();
    assert_eq!(info.point_data.count, 3);

    let mut points = MeshBuffer::zeroed(info.point_component_type, info.points_len())?;
    io.read_points(&mut points)?;
    let mut cells = MeshBuffer::zeroed(info.cell_component_type, info.cell_buffer_size)?;
    io.read_cells(&mut cells)?;

    let mut data = MeshBuffer::zeroed(info.point_data.component_type, info.point_data.buffer_len())?;
    assert!(matches!(io.read_point_data(&mut data), Err(Error::Format(_))));

    assert_eq!(points.as_slice::<f32>().unwrap(), &[0., 0., 0., 1., 0., 0., 0., 1., 0.]);
    assert_eq!(cells.as_slice::<u32>().unwrap(), &[4, 3, 0, 1, 2]);
    Ok(())
}

#[test]
fn test_write_without_file_name() -> Result<()> {
    let dir = TempDir::new()?;
    let mut io = VtkPolyDataMeshIO::new();
    assert!(matches!(io.write_mesh_information(), Err(Error::Config(_))));
    let mut io = ByuMeshIO::new();
    assert!(matches!(io.write_mesh_information(), Err(Error::Config(_))));
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_missing_file() {
    let mut io = ByuMeshIO::new();
    io.set_file_name("/definitely/missing/mesh.byu".as_ref());
    assert!(matches!(io.read_mesh_information(), Err(Error::FileNotFound(_))));
    assert!(!io.can_read("/definitely/missing/mesh.byu".as_ref()));
}

#[test]
fn test_not_a_vtk_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("bad.vtk");
    std::fs::write(&path, "solid cube\nfacet normal 0 0 1\n")?;

    let mut io = VtkPolyDataMeshIO::new();
    io.set_file_name(&path);
    assert!(matches!(io.read_mesh_information(), Err(Error::Format(_))));
    assert_eq!(io.state(), IoState::Unopened);

    std::fs::write(&path, "# vtk DataFile Version 3.0\nt\nASCII\nDATASET STRUCTURED_POINTS\n")?;
    io.set_file_name(&path);
    assert!(matches!(io.read_mesh_information(), Err(Error::Format(_))));
    Ok(())
}

#[test]
fn test_read_order_enforced() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tri.vtk");
    std::fs::write(
        &path,
        "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\n\
         POINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 1 4\n3 0 1 2\n",
    )?;

    let mut io = VtkPolyDataMeshIO::new();
    io.set_file_name(&path);
    io.read_mesh_information()?;
    assert_eq!(io.state(), IoState::Probed);
    assert!(matches!(io.read_mesh_information(), Err(Error::InvalidState { .. })));

    let info = io.info().clone();
    let mut cells = MeshBuffer::zeroed(info.cell_component_type, info.cell_buffer_size)?;
    io.read_cells(&mut cells)?;
    assert_eq!(io.state(), IoState::Materializing);

    let mut points = MeshBuffer::zeroed(info.point_component_type, info.points_len())?;
    assert!(matches!(io.read_points(&mut points), Err(Error::InvalidState { .. })));

    io.close();
    assert_eq!(io.state(), IoState::Closed);
    assert!(matches!(io.read_cells(&mut cells), Err(Error::InvalidState { .. })));
    Ok(())
}

#[test]
fn test_write_order_enforced() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tri.vtk");
    let mut io = VtkPolyDataMeshIO::new();
    io.set_file_name(&path);

    let points = MeshBuffer::from(vec![0f32, 0., 0., 1., 0., 0., 0., 1., 0.]);
    let cells = MeshBuffer::from(vec![4u32, 3, 0, 1, 2]);
    assert!(matches!(io.write_points(&points), Err(Error::InvalidState { .. })));

    *io.info_mut() = MeshInfo {
        number_of_points: 3,
        number_of_cells: 1,
        cell_buffer_size: 5,
        ..MeshInfo::default()
    };
    io.write_mesh_information()?;
    assert_eq!(io.state(), IoState::Writing);
    io.write_cells(&cells)?;
    assert!(matches!(io.write_points(&points), Err(Error::InvalidState { .. })));
    Ok(())
}

#[test]
fn test_buffer_contract() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tri.vtk");
    std::fs::write(
        &path,
        "# vtk DataFile Version 3.0\nt\nASCII\nDATASET POLYDATA\n\
         POINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 1 4\n3 0 1 2\n",
    )?;

    let mut io = VtkPolyDataMeshIO::new();
    io.set_file_name(&path);
    io.read_mesh_information()?;

    let mut wrong_type = MeshBuffer::zeroed(ComponentType::Float64, 9)?;
    assert!(matches!(io.read_points(&mut wrong_type), Err(Error::TypeMismatch { .. })));
    let mut short = MeshBuffer::zeroed(ComponentType::Float32, 6)?;
    assert!(matches!(io.read_points(&mut short), Err(Error::BufferSize { expected: 9, actual: 6 })));
    Ok(())
}
