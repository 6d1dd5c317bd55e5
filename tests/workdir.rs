use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::process::{self, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};

static TEST_DIR: &str = "cooccur-test-workdirs";
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory holding one test's input files and temporary chunks,
/// in which the compiled binary is spawned.
pub struct Workdir {
    root: PathBuf,
    dir: PathBuf,
}

impl Workdir {
    pub fn new(name: &str) -> Workdir {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);

        let mut root = env::current_exe()
            .unwrap()
            .parent()
            .expect("executable's directory")
            .to_path_buf();

        if root.ends_with("deps") {
            root.pop();
        }

        let dir = root.join(TEST_DIR).join(name).join(id.to_string());

        if let Err(err) = fs::remove_dir_all(&dir) {
            if err.kind() != std::io::ErrorKind::NotFound {
                panic!("could not wipe existing workdir: {}", err);
            }
        }

        fs::create_dir_all(&dir).unwrap();

        Workdir { root, dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn create(&self, name: &str, contents: &str) {
        let mut file = File::create(self.path(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    pub fn command(&self, sub_command: &str) -> process::Command {
        let mut cmd = process::Command::new(self.root.join("cooccur"));
        cmd.current_dir(&self.dir).arg(sub_command);
        cmd
    }

    /// Run the command with the given bytes piped through stdin and
    /// return its raw stdout. Panics if the command fails.
    pub fn pipe(&self, cmd: &mut process::Command, input: &str) -> Vec<u8> {
        let output = self.run_with_input(cmd, input);

        if !output.status.success() {
            panic!(
                "command failed with {}.\n\nstderr:\n{}",
                output.status,
                String::from_utf8_lossy(&output.stderr),
            );
        }

        output.stdout
    }

    /// Same as `pipe`, but decoding stdout as utf-8 lines.
    pub fn pipe_lines(&self, cmd: &mut process::Command, input: &str) -> Vec<String> {
        String::from_utf8(self.pipe(cmd, input))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Run the command expecting a failure, returning its stderr.
    pub fn pipe_err(&self, cmd: &mut process::Command, input: &str) -> String {
        let output = self.run_with_input(cmd, input);

        if output.status.success() {
            panic!("command unexpectedly succeeded!");
        }

        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    fn run_with_input(&self, cmd: &mut process::Command, input: &str) -> process::Output {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let mut stdin = child.stdin.take().unwrap();

        // The command may fail before draining its input.
        let _ = stdin.write_all(input.as_bytes());
        drop(stdin);

        child.wait_with_output().unwrap()
    }

    pub fn read_to_string(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    /// Names of the files currently present in the scratch directory.
    pub fn files(&self) -> Vec<String> {
        let mut names = fs::read_dir(&self.dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        names.sort();
        names
    }

    pub fn assert_no_file_matching(&self, pattern: &str) {
        for name in self.files() {
            if name.contains(pattern) {
                panic!("file \"{}\" should not exist!", name);
            }
        }
    }
}
