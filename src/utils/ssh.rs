use crate::utils::exec::{Runner, check_output, shell_escape};
use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// SSH connection for remote command execution
pub struct SshConnection {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<String>,
    use_sshpass: bool,
}

impl SshConnection {
    pub fn new(
        host: &str,
        port: u16,
        user: &str,
        password: Option<String>,
        key: Option<String>,
    ) -> Self {
        // Plain ssh cannot take a password non-interactively; sshpass can
        let use_sshpass = key.is_none() && password.is_some() && which::which("sshpass").is_ok();

        Self {
            host: host.to_string(),
            port,
            user: user.to_string(),
            password,
            key,
            use_sshpass,
        }
    }

    fn is_root(&self) -> bool {
        self.user == "root"
    }

    fn build_command(&self) -> Command {
        let mut cmd = if self.use_sshpass {
            let mut cmd = Command::new("sshpass");
            cmd.arg("-e").arg("ssh");
            if let Some(ref password) = self.password {
                cmd.env("SSHPASS", password);
            }
            cmd
        } else {
            Command::new("ssh")
        };

        cmd.args([
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "ConnectTimeout=10",
            "-p",
            &self.port.to_string(),
        ]);

        if let Some(ref key) = self.key {
            cmd.args(["-i", key]);
        }
        if !self.use_sshpass {
            cmd.args(["-o", "BatchMode=yes"]);
        }

        cmd.arg(format!("{}@{}", self.user, self.host));
        cmd
    }

    /// Wrap a script so it runs under bash with `set -e`, as root
    fn remote_script(&self, script: &str) -> String {
        let body = shell_escape(&format!("set -e\n{}", script));
        if self.is_root() {
            format!("bash -c {}", body)
        } else if self.password.is_some() {
            format!("sudo -S -p '' bash -c {}", body)
        } else {
            format!("sudo -n bash -c {}", body)
        }
    }

    /// Bytes sudo expects on stdin before the command's own input
    fn sudo_preamble(&self) -> Option<Vec<u8>> {
        if self.is_root() {
            return None;
        }
        self.password
            .as_ref()
            .map(|password| format!("{}\n", password).into_bytes())
    }

    fn execute(&self, script: &str, input: Option<&[u8]>) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.arg(self.remote_script(script));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let preamble = self.sudo_preamble();
        if preamble.is_none() && input.is_none() {
            cmd.stdin(Stdio::null());
            return cmd
                .output()
                .with_context(|| format!("Failed to execute ssh to {}", self.host));
        }

        cmd.stdin(Stdio::piped());
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn ssh to {}", self.host))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Some(ref preamble) = preamble {
                stdin.write_all(preamble)?;
            }
            if let Some(input) = input {
                stdin.write_all(input)?;
            }
            stdin.flush()?;
        }

        child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for ssh to {}", self.host))
    }
}

impl Runner for SshConnection {
    fn run(&self, command: &str) -> Result<()> {
        let output = self.execute(command, None)?;
        check_output(output, "remote command")?;
        Ok(())
    }

    fn run_out(&self, command: &str) -> Result<Vec<u8>> {
        let output = self.execute(command, None)?;
        check_output(output, "remote command")
    }

    fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let escaped = shell_escape(path);
        let script = format!("mkdir -p \"$(dirname {})\"\ncat > {}", escaped, escaped);
        let output = self.execute(&script, Some(content))?;
        check_output(output, "write file")
            .with_context(|| format!("Failed to write file: {}", path))?;
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        let output = self.execute(&format!("rm -f {}", shell_escape(path)), None)?;
        check_output(output, "remove file")
            .with_context(|| format!("Failed to remove file: {}", path))?;
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        let output = self.execute(
            &format!("test -f {} && echo exists || echo missing", shell_escape(path)),
            None,
        )?;
        let stdout = check_output(output, "test file")?;
        Ok(String::from_utf8_lossy(&stdout).trim() == "exists")
    }
}
