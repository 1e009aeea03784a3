//! In-process description of a generated tree.
//!
//! ```no_run
//! use std::fmt::Write;
//! use filegen::builder::Filegen;
//!
//! let mut fg = Filegen::new(".");
//! fg.dir("greeting", |fg| {
//!     fg.file("hello.txt", |wf| Ok(write!(wf, "hello")?))
//! })?;
//! # Ok::<(), filegen::error::Error>(())
//! ```

use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub name: String,
    pub path: PathBuf,
    pub children: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

/// Entry of a described tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Directory(Directory),
    File(File),
}

/// Collects directories and files; nothing touches the disk until a writer emits it.
#[derive(Debug, Clone)]
pub struct Filegen {
    /// Open directories, the root first.
    frames: Vec<Directory>,
}

impl Filegen {
    /// Starts a tree rooted at `curdir`.
    pub fn new<P: AsRef<Path>>(curdir: P) -> Self {
        let curdir = curdir.as_ref();
        Self {
            frames: vec![Directory {
                name: curdir.display().to_string(),
                path: curdir.to_path_buf(),
                children: Vec::new(),
            }],
        }
    }

    fn current(&mut self) -> &mut Directory {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Path a new entry called `name` would get.
    pub fn fullpath(&self, name: &str) -> PathBuf {
        let last = self.frames.len() - 1;
        self.frames[last].path.join(name)
    }

    /// Adds directory `name`; entries added by `f` go inside it.
    ///
    /// The enclosing directory is current again afterwards, also when `f` fails.
    pub fn dir<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Filegen) -> Result<()>,
    {
        let path = self.fullpath(name);
        self.frames.push(Directory {
            name: name.to_string(),
            path,
            children: Vec::new(),
        });
        let result = f(self);
        if let Some(dir) = self.frames.pop() {
            if result.is_ok() {
                self.current().children.push(Item::Directory(dir));
            }
        }
        result
    }

    /// Adds file `name` with the content written by `f`.
    pub fn file<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut String) -> Result<()>,
    {
        let mut content = String::new();
        f(&mut content)?;
        let path = self.fullpath(name);
        self.current().children.push(Item::File(File {
            name: name.to_string(),
            path,
            content,
        }));
        Ok(())
    }

    pub fn root(&self) -> &Directory {
        &self.frames[0]
    }

    pub fn into_root(mut self) -> Directory {
        self.frames.swap_remove(0)
    }
}
