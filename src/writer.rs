//! Writers that turn a described tree into output.

use std::fs;
use std::path::Path;

use log::info;

use crate::builder::{Directory, File, Item};
use crate::constants::PACKAGE_MARKER;
use crate::error::Result;

/// Emits a described tree somewhere.
pub trait Emitter {
    fn emit(&self, root: &Directory) -> Result<()>;
}

/// Prints the tree as `d:`/`f:` lines, optionally with a preview of each file.
#[derive(Debug, Clone)]
pub struct TreePrinter {
    /// Number of characters of content shown per file.
    pub limit: usize,
    pub contents: bool,
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self {
            limit: 80,
            contents: true,
        }
    }
}

impl TreePrinter {
    /// Lists paths only.
    pub fn paths_only() -> Self {
        Self {
            contents: false,
            ..Self::default()
        }
    }

    /// Returns what [`Emitter::emit`] prints.
    pub fn render(&self, root: &Directory) -> String {
        let mut out = String::new();
        self.render_directory(root, 0, &mut out);
        out
    }

    fn render_directory(&self, dir: &Directory, indent: usize, out: &mut String) {
        out.push_str(&format!("{}d:{}\n", " ".repeat(indent), dir.path.display()));
        for child in &dir.children {
            match child {
                Item::Directory(sub) => self.render_directory(sub, indent + 1, out),
                Item::File(file) => self.render_file(file, indent + 1, out),
            }
        }
    }

    fn render_file(&self, file: &File, indent: usize, out: &mut String) {
        let padding = " ".repeat(indent);
        out.push_str(&format!("{padding}f:{}\n", file.path.display()));
        if !self.contents {
            return;
        }
        let preview: String = file.content.chars().take(self.limit).collect();
        for line in preview.split('\n') {
            out.push_str(&format!("{padding}  {line}\n"));
        }
    }
}

impl Emitter for TreePrinter {
    fn emit(&self, root: &Directory) -> Result<()> {
        print!("{}", self.render(root));
        Ok(())
    }
}

/// Creates missing directories and (over)writes every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryMaker;

/// Like [`DirectoryMaker`], and puts an empty package marker into every directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageMaker;

fn make_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        info!("create directory {}", path.display());
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn make_package_marker(dir: &Path) -> Result<()> {
    let marker = dir.join(PACKAGE_MARKER);
    if !marker.exists() {
        info!("write file {}", marker.display());
        fs::write(&marker, "")?;
    }
    Ok(())
}

fn branch_directory(dir: &Directory, package: bool) -> Result<()> {
    make_directory(&dir.path)?;
    if package {
        make_package_marker(&dir.path)?;
    }
    for child in &dir.children {
        match child {
            Item::Directory(sub) => branch_directory(sub, package)?,
            Item::File(file) => {
                info!("write file {}", file.path.display());
                fs::write(&file.path, &file.content)?;
            }
        }
    }
    Ok(())
}

impl Emitter for DirectoryMaker {
    fn emit(&self, root: &Directory) -> Result<()> {
        branch_directory(root, false)
    }
}

impl Emitter for PackageMaker {
    fn emit(&self, root: &Directory) -> Result<()> {
        branch_directory(root, true)
    }
}
