use lazy_exe::LazyExe;

#[cfg(unix)]
static PAYLOAD: &[u8] = b"#!/bin/sh\necho hello from lazy-exe\n";
#[cfg(not(unix))]
static PAYLOAD: &[u8] = b"not runnable on this platform";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // in a real host this would be include_bytes!("some_tool")
    let exe = LazyExe::new(PAYLOAD);

    let path = exe.path()?;
    println!("materialized at {}", path.display());

    #[cfg(unix)]
    {
        let out = std::process::Command::new(&path).output()?;
        print!("{}", String::from_utf8_lossy(&out.stdout));
    }

    // the caller owns the cleanup on every exit path
    exe.cleanup()?;
    Ok(())
}
