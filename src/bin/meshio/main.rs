//! meshio CLI - inspect and convert mesh files.

use std::env;
use std::path::Path;
use std::process;

use meshio::byu::ByuMeshIO;
use meshio::core::{AttributeInfo, CellClass, CellClassCounts, MeshIO};
use meshio::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Options shared by all commands.
#[derive(Debug, Default)]
struct Options {
    file_type: Option<FileType>,
    part: Option<u32>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut options = Options::default();
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "-b" | "--binary" => options.file_type = Some(FileType::Binary),
            "-a" | "--ascii" => options.file_type = Some(FileType::Ascii),
            "-p" | "--part" => {
                let part = iter.next().and_then(|s| s.parse().ok());
                if part.is_none() {
                    eprintln!("Error: --part expects a zero-based part number");
                    process::exit(1);
                }
                options.part = part;
            }
            _ => filtered_args.push(arg),
        }
    }

    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: meshio info <file>");
                process::exit(1);
            }
            cmd_info(filtered_args[1], &options)
        }
        "copy" | "c" => {
            if filtered_args.len() < 3 {
                eprintln!("Error: missing file arguments");
                eprintln!("Usage: meshio copy <in> <out> [--binary|--ascii]");
                process::exit(1);
            }
            cmd_copy(filtered_args[1], filtered_args[2], &options)
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // Passing a mesh file directly is equivalent to 'info'
        path if Path::new(path).is_file() => cmd_info(path, &options),
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("meshio - mesh file toolkit (VTK legacy POLYDATA, Movie.BYU)");
    println!();
    println!("USAGE:");
    println!("    meshio [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>              Show counts, types and attributes");
    println!("    c, copy   <in> <out>          Convert between formats (chosen by extension)");
    println!("    h, help                       Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -b, --binary     Write VTK output as BINARY");
    println!("    -a, --ascii      Write VTK output as ASCII");
    println!("    -p, --part <n>   Read only part n (zero-based) of a BYU file");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("EXAMPLES:");
    println!("    meshio info bunny.vtk");
    println!("    meshio copy bunny.vtk bunny.byu");
    println!("    meshio --binary copy in.vtk out.vtk");
    println!("    meshio --part 1 copy car.byu wheel.vtk");
}

/// Build a reader for `path`, applying the BYU part selection.
fn open_reader(path: &Path, options: &Options) -> Result<Box<dyn MeshIO>> {
    let codec = codec_for_path(path)?;
    match options.part {
        Some(part) if codec.format_name() == "byu" => {
            let mut byu = ByuMeshIO::new();
            byu.set_file_name(path);
            byu.set_part_id(Some(part));
            Ok(Box::new(byu))
        }
        Some(_) => {
            warn!("--part only applies to BYU files, ignored");
            Ok(codec)
        }
        None => Ok(codec),
    }
}

fn cmd_info(path: &str, options: &Options) -> Result<()> {
    info!("Probing {}", path);
    let mut io = open_reader(Path::new(path), options)?;
    io.read_mesh_information()?;
    let info = io.info().clone();
    let meta = io.metadata();

    println!("File:    {}", path);
    println!("Format:  {} ({})", io.format_name(), info.file_type);
    if let Some(title) = meta.title() {
        println!("Title:   {}", title);
    }
    println!(
        "Points:  {} x {} {}",
        info.number_of_points, info.point_dimension, info.point_component_type
    );
    println!(
        "Cells:   {} ({} {} values)",
        info.number_of_cells, info.cell_buffer_size, info.cell_component_type
    );
    let counts = CellClassCounts::from_metadata(meta);
    for class in CellClass::ALL {
        let (cells, indices) = counts.class(class);
        if cells > 0 {
            println!("  {:<9} {} cells, {} indices", class.keyword(), cells, indices);
        }
    }
    print_attribute("Point data", &info.point_data);
    print_attribute("Cell data", &info.cell_data);

    debug!("{} metadata entries", meta.len());
    for (key, value) in meta.iter() {
        debug!("  {} = {}", key, value);
    }
    io.close();
    Ok(())
}

fn print_attribute(label: &str, attr: &AttributeInfo) {
    if attr.count == 0 {
        return;
    }
    println!(
        "{}: {} x {} ({}, {})",
        label, attr.count, attr.components, attr.pixel_type, attr.component_type
    );
}

fn cmd_copy(input: &str, output: &str, options: &Options) -> Result<()> {
    info!("Reading {}", input);
    let mut reader = open_reader(Path::new(input), options)?;
    let mut mesh = MeshData::read_from(&mut *reader)?;

    let mut writer = codec_for_path(Path::new(output))?;
    if writer.format_name() == "byu" && mesh.has_attributes() {
        warn!("BYU files carry no attribute data, dropping point and cell data");
        mesh.clear_attributes();
    }
    if let Some(file_type) = options.file_type {
        mesh.info.file_type = file_type;
    }

    info!("Writing {} ({})", output, mesh.info.file_type);
    mesh.write_to(&mut *writer)?;
    println!(
        "Copied {} points, {} cells: {} -> {}",
        mesh.info.number_of_points, mesh.info.number_of_cells, input, output
    );
    Ok(())
}
