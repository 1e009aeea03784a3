//! Asks for a name and greets it in three files.
//!
//! ```text
//! cargo run --example greeting -- --mode tree
//! cargo run --example greeting -- --mode files ./out
//! ```

use std::fmt::Write;

use filegen::app::Application;
use filegen::builder::Filegen;
use filegen::prompt::Prompter;

fn main() {
    Application::new().run(|prompt, root| {
        let yourname = prompt.resolve("yourname", Some("what is your name"), Some("foo"))?;
        let shouted = yourname.to_uppercase();

        let mut fg = Filegen::new(root);
        fg.dir("greeting", |fg| {
            fg.file("hello.txt", |wf| Ok(write!(wf, "{yourname}: hello.")?))?;
            fg.file("bye.txt", |wf| Ok(write!(wf, "{yourname}: bye.")?))?;
            fg.file("is_angry.txt", |wf| Ok(write!(wf, "{shouted}: HEY!")?))
        })?;
        Ok(fg)
    });
}
