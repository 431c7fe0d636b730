use heapfs::{FileSystem, FileSystemConfig};

pub struct Fixture {
    pub fs: FileSystem,
}

impl Fixture {
    pub fn new() -> Self {
        Self { fs: FileSystem::new(FileSystemConfig::unix()).expect("build filesystem") }
    }

    pub fn with_config(config: FileSystemConfig) -> Self {
        Self { fs: FileSystem::new(config).expect("build filesystem") }
    }

    pub fn path(&self, name: &str) -> String {
        format!("/work/{name}")
    }

    pub fn write_file(&self, name: &str, data: &[u8]) {
        let channel = self
            .fs
            .open_channel(&self.path(name), heapfs::OpenOptions::write().with_create(), &[])
            .expect("open for write");
        channel.write(data).expect("write fixture file");
        channel.close().expect("close fixture file");
    }

    pub fn read_file(&self, name: &str) -> Vec<u8> {
        let channel = self.fs.open_channel(&self.path(name), heapfs::OpenOptions::read(), &[]).expect("open for read");
        let size = channel.size().expect("file size") as usize;
        let mut buf = vec![0u8; size];
        if size == 0 {
            return buf;
        }
        let n = channel.read(&mut buf).expect("read fixture file");
        buf.truncate(n.max(0) as usize);
        buf
    }
}
