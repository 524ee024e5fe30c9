use std::path::PathBuf;

use failure::{format_err, Error};
use softbody::{
    Command, SoftBodySystem, SoftContext, TetraModel,
    files::SoftFileInterface,
    physics::KinematicScene,
    tetra::GridTetraMaker,
};


pub mod info;
pub mod simulate;
pub mod tetra;


/// File "dialogs" of the command line: there is nobody to ask, so every
/// command has to carry its path. Messages are printed.
struct Terminal;

impl SoftFileInterface for Terminal {
    fn soft_file_name(&mut self, name: &str, for_read: bool) -> Option<PathBuf> {
        let path = PathBuf::from(name);
        if for_read && !path.is_file() {
            return None;
        }
        Some(path)
    }

    fn save_file_name(&mut self, _: &str, _: &str) -> Option<PathBuf> {
        None
    }

    fn load_file_name(&mut self, _: &str, _: &str) -> Option<PathBuf> {
        None
    }

    fn message_report(&mut self, msg: &str) {
        info!("{}", msg);
    }
}

/// A soft body system with the collaborators available on the command
/// line.
struct Session {
    scene: KinematicScene,
    files: Terminal,
    maker: GridTetraMaker,
    system: SoftBodySystem,
}

impl Session {
    fn new() -> Self {
        let scene = KinematicScene::new();
        let system = SoftBodySystem::new(&scene);
        Self {
            scene,
            files: Terminal,
            maker: GridTetraMaker::default(),
            system,
        }
    }

    /// Runs the command, turning a failure into an error. The reason of the
    /// failure has already been printed by then.
    fn run(&mut self, cmd: Command) -> Result<(), Error> {
        let name = cmd.name();
        let mut ctx = SoftContext {
            scene: &mut self.scene,
            files: &mut self.files,
            maker: &mut self.maker,
        };

        if self.system.process_command(&mut ctx, cmd) {
            Ok(())
        } else {
            Err(format_err!("command '{}' failed", name))
        }
    }

    fn model(&self) -> Result<&TetraModel, Error> {
        self.system.edit_target().ok_or_else(|| format_err!("no model loaded"))
    }
}
