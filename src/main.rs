//! assetbake CLI
//!
//! Command-line interface for inspecting containers, baking source images,
//! and extracting previews.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use assetbake_export::{bake_image, BakeImageOptions, ImageFormat, TextureConvertOptions, TextureConverter};
use assetbake_format::logging::{self, TracingConfig};
use assetbake_format::{read_asset_file, Asset, CodecOptions, Compression, ImageBuffer, MeshBuffer};

/// assetbake - bake images and meshes into binary asset containers
#[derive(Parser)]
#[command(name = "assetbake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for structured data
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a container
    Info(InfoArgs),

    /// Bake an image file into a container
    BakeImage(BakeImageArgs),

    /// Write previews of an image container
    Extract(ExtractArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Path to the container
    path: PathBuf,

    /// Show per-cell or per-submesh details
    #[arg(short, long)]
    detailed: bool,

    /// Skip mesh validation while reading
    #[arg(long)]
    lenient: bool,
}

#[derive(Args)]
struct BakeImageArgs {
    /// Source image (PNG, TGA, JPEG, HDR, ...)
    input: PathBuf,

    /// Output container path (defaults to the input with .ast)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mip levels to store (0 = full chain)
    #[arg(short, long, default_value = "1")]
    mips: usize,

    /// Compression: none, bc1, bc2, bc3, bc4, bc5
    #[arg(short, long, default_value = "none", value_parser = parse_compression)]
    compression: Compression,

    /// Store pixels in BGRA order
    #[arg(long)]
    bgra: bool,

    /// Weight color error by alpha when compressing
    #[arg(long)]
    alpha_weighted: bool,
}

#[derive(Args)]
struct ExtractArgs {
    /// Image container to extract
    input: PathBuf,

    /// Output file path (extension follows --image-format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Preview format: png, tga, bmp
    #[arg(long, default_value = "png", value_parser = parse_image_format)]
    image_format: ImageFormat,

    /// Array slice to extract
    #[arg(long, default_value = "0")]
    slice: usize,

    /// Also write every mip level
    #[arg(long)]
    mipmaps: bool,

    /// Flip vertically
    #[arg(long)]
    flip_y: bool,

    /// Invert the green channel (DirectX to OpenGL normal maps)
    #[arg(long)]
    normal_map: bool,
}

fn parse_compression(s: &str) -> Result<Compression, String> {
    Compression::from_name(s).ok_or_else(|| format!("Unknown compression: {}", s))
}

fn parse_image_format(s: &str) -> Result<ImageFormat, String> {
    ImageFormat::from_name(s).ok_or_else(|| format!("Unknown image format: {}", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_config(TracingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Info(args) => cmd_info(args, cli.format),
        Commands::BakeImage(args) => cmd_bake_image(args),
        Commands::Extract(args) => cmd_extract(args),
    }
}

fn cmd_info(args: InfoArgs, format: OutputFormat) -> Result<()> {
    let options = CodecOptions {
        strict_validation: !args.lenient,
        ..Default::default()
    };
    let asset = read_asset_file(&args.path, &options)
        .with_context(|| format!("Failed to read container {:?}", args.path))?;
    let size = std::fs::metadata(&args.path)?.len();

    match asset {
        Asset::Image(image) => show_image_info(&args.path, size, &image, args.detailed, format),
        Asset::Mesh(mesh) => show_mesh_info(&args.path, size, &mesh, args.detailed, format),
    }
}

fn show_image_info(path: &Path, size: u64, image: &ImageBuffer, detailed: bool, format: OutputFormat) -> Result<()> {
    let (width, height) = image.base_dimensions();

    match format {
        OutputFormat::Json => {
            let cells: Vec<_> = image
                .cells()
                .map(|(slice, mip, cell)| {
                    serde_json::json!({
                        "slice": slice,
                        "mip": mip,
                        "width": cell.width(),
                        "height": cell.height(),
                        "size": cell.byte_size(),
                    })
                })
                .collect();
            let json = serde_json::json!({
                "type": "image",
                "name": image.name(),
                "width": width,
                "height": height,
                "pixel_type": image.pixel_type().to_string(),
                "components": image.components(),
                "compression": image.compression().to_string(),
                "array_slices": image.array_slices(),
                "mip_slices": image.mip_slices(),
                "file_size": size,
                "cells": cells,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Image container: {:?}", path);
            println!("  Name:         {}", image.name());
            println!("  Dimensions:   {}x{}", width, height);
            println!("  Pixel type:   {} x {}", image.pixel_type(), image.components());
            println!("  Compression:  {}", image.compression());
            println!("  Slices:       {}", image.array_slices());
            println!("  Mip levels:   {}", image.mip_slices());
            println!("  Pixel data:   {}", format_size(image.total_bytes() as u64));
            println!("  File size:    {}", format_size(size));

            if detailed {
                println!("\nCells:");
                for (slice, mip, cell) in image.cells() {
                    println!(
                        "  [{}:{}] {}x{} {}",
                        slice,
                        mip,
                        cell.width(),
                        cell.height(),
                        format_size(cell.byte_size() as u64)
                    );
                }
            }
        }
    }

    Ok(())
}

fn show_mesh_info(path: &Path, size: u64, mesh: &MeshBuffer, detailed: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let submeshes: Vec<_> = mesh
                .submeshes
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name,
                        "material_index": s.material_index,
                        "index_count": s.index_count,
                        "vertex_count": s.vertex_count,
                        "base_index": s.base_index,
                        "extents": s.extents,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "type": "mesh",
                "name": mesh.name,
                "vertices": mesh.vertex_count(),
                "skinned": mesh.is_skinned(),
                "indices": mesh.index_count(),
                "triangles": mesh.triangle_count(),
                "extents": mesh.extents,
                "materials": mesh.materials.iter().map(|m| m.path()).collect::<Vec<_>>(),
                "file_size": size,
                "submeshes": submeshes,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            let extents = mesh.extents;
            println!("Mesh container: {:?}", path);
            println!("  Name:       {}", mesh.name);
            println!("  Vertices:   {}{}", mesh.vertex_count(), if mesh.is_skinned() { " (skinned)" } else { "" });
            println!("  Triangles:  {}", mesh.triangle_count());
            println!("  Submeshes:  {}", mesh.submeshes.len());
            println!(
                "  Extents:    ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                extents.min.x, extents.min.y, extents.min.z, extents.max.x, extents.max.y, extents.max.z
            );
            println!("  File size:  {}", format_size(size));

            println!("\nMaterials:");
            for (i, material) in mesh.materials.iter().enumerate() {
                println!("  {}. {}", i, material);
            }

            if detailed {
                println!("\nSubmeshes:");
                for submesh in &mesh.submeshes {
                    let indices = submesh.index_range();
                    println!(
                        "  {} (material {}, {} triangles, indices {}..{})",
                        submesh.name,
                        submesh.material_index,
                        submesh.triangle_count(),
                        indices.start,
                        indices.end
                    );
                }
            }
        }
    }

    Ok(())
}

fn cmd_bake_image(args: BakeImageArgs) -> Result<()> {
    if !args.input.exists() {
        bail!("File not found: {:?}", args.input);
    }
    let output = args.output.unwrap_or_else(|| args.input.with_extension("ast"));
    let options = BakeImageOptions {
        mip_count: args.mips,
        compression: args.compression,
        bgra: args.bgra,
        weigh_colour_by_alpha: args.alpha_weighted,
    };

    let image = bake_image(&args.input, &output, &options)
        .with_context(|| format!("Failed to bake {:?}", args.input))?;

    let (width, height) = image.base_dimensions();
    println!("Baked {:?} -> {:?}", args.input, output);
    println!("  {}x{}, {} mips, {}", width, height, image.mip_slices(), image.compression());

    Ok(())
}

fn cmd_extract(args: ExtractArgs) -> Result<()> {
    let image = match read_asset_file(&args.input, &CodecOptions::default())
        .with_context(|| format!("Failed to read container {:?}", args.input))?
    {
        Asset::Image(image) => image,
        Asset::Mesh(_) => bail!("{:?} is a mesh container; only images can be extracted", args.input),
    };
    if args.slice >= image.array_slices() {
        bail!("Slice {} out of range (image has {})", args.slice, image.array_slices());
    }

    let output = args.output.unwrap_or_else(|| args.input.clone());
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    let converter = TextureConverter::with_options(TextureConvertOptions {
        format: args.image_format,
        slice: args.slice,
        include_mipmaps: args.mipmaps,
        flip_y: args.flip_y,
        convert_normal_map: args.normal_map,
        ..Default::default()
    });
    let written = converter
        .convert(&image, &output)
        .with_context(|| format!("Failed to extract {:?}", args.input))?;

    println!("Extraction complete:");
    for path in &written {
        println!("  {}", path.display());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
