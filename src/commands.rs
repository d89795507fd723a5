//! Subcommand implementations

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;

use ccfs_common::{
    DirEntry, EntryInfo, EntryKind, EntryPos, FormatOptions, Volume, VolumeInfo, BLOCK_SIZE,
    DEFAULT_CAPACITY, ROOT_BLOCK,
};

/// Size suffixes accepted by `--size`
const SIZE_SUFFIXES: &[(&str, u64)] = &[
    ("KB", 1024),
    ("K", 1024),
    ("MB", 1024 * 1024),
    ("M", 1024 * 1024),
];

/// Parse a byte size with an optional K/M suffix
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();
    let (digits, mult) = SIZE_SUFFIXES
        .iter()
        .find_map(|&(suffix, mult)| s.strip_suffix(suffix).map(|rest| (rest, mult)))
        .unwrap_or((s.as_str(), 1));

    digits.trim().parse::<u64>().ok()?.checked_mul(mult)
}

/// Reject lookup arguments that no record name could match
pub fn check_path(path: &str) -> anyhow::Result<()> {
    if !path.starts_with(ccfs_path::SEPARATOR) {
        bail!("{}: path must be absolute", path);
    }
    for component in ccfs_path::components(path) {
        if !ccfs_path::is_valid_name(component) {
            bail!("{}: invalid path component {:?}", path, component);
        }
    }
    Ok(())
}

/// Build format options from command-line arguments
pub fn format_options(
    image: &Path,
    label: Option<String>,
    capacity: Option<u32>,
    size: Option<&str>,
) -> anyhow::Result<FormatOptions> {
    let capacity = match (capacity, size) {
        (Some(blocks), _) => blocks,
        (None, Some(size)) => {
            let bytes = parse_size(size).with_context(|| format!("invalid size: {}", size))?;
            u32::try_from(bytes / BLOCK_SIZE as u64)
                .with_context(|| format!("size too large: {}", size))?
        }
        (None, None) => DEFAULT_CAPACITY,
    };

    let label = label.unwrap_or_else(|| {
        image
            .file_stem()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let options = FormatOptions::new(label, capacity);
    options.validate()?;
    Ok(options)
}

fn open(image: &Path) -> anyhow::Result<Volume<File>> {
    Volume::open_file(image).with_context(|| format!("failed to load {}", image.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_info(info: &VolumeInfo) {
    println!("Label:        {}", info.label);
    println!("Capacity:     {} blocks", info.capacity);
    println!("Available:    {} blocks", info.available);
    println!("First empty:  {}", info.first_empty);
    println!("Free in FAT:  {} blocks", info.free_blocks);
    println!("Block size:   {} bytes", info.block_size);
    println!("Data pool:    0x{:x}", info.pool_offset);
    println!("Image size:   {} bytes", info.image_size);
}

fn print_entry_line(path: &str, entry: &EntryInfo) {
    let kind = match entry.kind {
        EntryKind::Directory => 'd',
        EntryKind::File => '-',
    };
    println!(
        "{} {:>10}  {:>5}:{:<2}  {:>5}  {}",
        kind, entry.size, entry.block, entry.slot, entry.first_block, path
    );
}

pub fn mkfs(image: &Path, options: &FormatOptions, json: bool) -> anyhow::Result<()> {
    info!(image = %image.display(), capacity = options.capacity, "formatting");
    let volume = Volume::create_file(image, options)
        .with_context(|| format!("failed to create {}", image.display()))?;

    if json {
        return print_json(&volume.info());
    }

    println!("Created CCFS volume: {}", image.display());
    print_info(&volume.info());
    Ok(())
}

pub fn info(image: &Path, json: bool) -> anyhow::Result<()> {
    let volume = open(image)?;
    if json {
        return print_json(&volume.info());
    }

    print_info(&volume.info());
    Ok(())
}

pub fn stat(image: &Path, path: &str, json: bool) -> anyhow::Result<()> {
    check_path(path)?;
    let mut volume = open(image)?;
    let Some(entry) = volume.resolve(path)? else {
        bail!("{}: no such file or directory", path);
    };

    let entry = entry.info();
    if json {
        return print_json(&entry);
    }

    println!("Name:         {}", entry.name);
    println!("Type:         {:?}", entry.kind);
    println!("Record:       block {} slot {}", entry.block, entry.slot);
    println!("First block:  {}", entry.first_block);
    println!("Size:         {} bytes", entry.size);
    println!("Attributes:   0x{:02x}", entry.attributes);
    println!("Time:         0x{:04x}", entry.time);
    println!("Date:         0x{:04x}", entry.date);
    Ok(())
}

pub fn ls(image: &Path, path: &str, json: bool) -> anyhow::Result<()> {
    if path != "/" {
        check_path(path)?;
    }
    let mut volume = open(image)?;

    // the root directory has no record of its own
    let entries: Vec<DirEntry> = if path == "/" {
        volume.read_dir_at(EntryPos::ROOT)?
    } else {
        match volume.resolve(path)? {
            Some(dir) if dir.is_directory() => volume.read_dir(&dir)?,
            Some(file) => vec![file],
            None => bail!("{}: no such file or directory", path),
        }
    };

    let infos: Vec<EntryInfo> = entries.iter().map(DirEntry::info).collect();
    if json {
        return print_json(&infos);
    }

    for entry in &infos {
        print_entry_line(&entry.name, entry);
    }
    Ok(())
}

#[derive(Serialize)]
struct TreeEntry {
    path: String,
    #[serde(flatten)]
    entry: EntryInfo,
}

fn walk(
    volume: &mut Volume<File>,
    entries: Vec<DirEntry>,
    prefix: &str,
    visited: &mut HashSet<u16>,
    out: &mut Vec<TreeEntry>,
) -> anyhow::Result<()> {
    for entry in entries {
        let path = ccfs_path::join(prefix, &entry.name());
        let descend = entry.is_directory() && visited.insert(entry.first_block());
        out.push(TreeEntry {
            path: path.clone(),
            entry: entry.info(),
        });

        if descend {
            let children = volume.read_dir(&entry)?;
            walk(volume, children, &path, visited, out)?;
        }
    }
    Ok(())
}

pub fn tree(image: &Path, json: bool) -> anyhow::Result<()> {
    let mut volume = open(image)?;
    let root = volume.read_dir_at(EntryPos::ROOT)?;

    let mut visited = HashSet::from([ROOT_BLOCK]);
    let mut out = Vec::new();
    walk(&mut volume, root, "/", &mut visited, &mut out)?;

    if json {
        return print_json(&out);
    }

    for node in &out {
        print_entry_line(&node.path, &node.entry);
    }
    Ok(())
}
