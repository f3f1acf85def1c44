//! Uniform read/write access to path-addressed documents.

use jsonkit_core::{Error, Node, Path};

use crate::store::Store;

/// Read values from paths.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Reader>`.
pub trait Reader: Send + Sync {
    /// Read the value at a path.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing lives at the path.
    /// * `Ok(Some(node))` - A copy of the value at the path.
    /// * `Err(Error)` - An error occurred.
    fn read(&mut self, from: &Path) -> Result<Option<Node>, Error>;
}

/// Write values to paths.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Writer>`.
pub trait Writer: Send + Sync {
    /// Write a value to a path, creating it if needed. Returns the path the
    /// value landed at.
    fn write(&mut self, to: &Path, data: Node) -> Result<Path, Error>;
}

/// Combined read/write access.
pub trait DocumentStore: Reader + Writer {}
impl<T: Reader + Writer> DocumentStore for T {}

impl Reader for Store {
    fn read(&mut self, from: &Path) -> Result<Option<Node>, Error> {
        Ok(self.view(from).cloned())
    }
}

impl Writer for Store {
    fn write(&mut self, to: &Path, data: Node) -> Result<Path, Error> {
        self.set(to, data)?;
        Ok(to.clone())
    }
}

impl<T: Reader + ?Sized> Reader for &mut T {
    fn read(&mut self, from: &Path) -> Result<Option<Node>, Error> {
        (*self).read(from)
    }
}

impl<T: Writer + ?Sized> Writer for &mut T {
    fn write(&mut self, to: &Path, data: Node) -> Result<Path, Error> {
        (*self).write(to, data)
    }
}

impl<T: Reader + ?Sized> Reader for Box<T> {
    fn read(&mut self, from: &Path) -> Result<Option<Node>, Error> {
        self.as_mut().read(from)
    }
}

impl<T: Writer + ?Sized> Writer for Box<T> {
    fn write(&mut self, to: &Path, data: Node) -> Result<Path, Error> {
        self.as_mut().write(to, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonkit_core::path;

    #[test]
    fn store_reads_and_writes_through_traits() {
        let mut store = Store::new();
        let boxed: &mut dyn DocumentStore = &mut store;

        let written = boxed.write(&path!("users/0/name"), Node::from("Alice")).unwrap();
        assert_eq!(written, path!("users/0/name"));
        assert_eq!(boxed.read(&written).unwrap(), Some(Node::from("Alice")));
        assert_eq!(boxed.read(&path!("users/1")).unwrap(), None);
    }

    #[test]
    fn boxed_store_works() {
        let mut boxed: Box<dyn DocumentStore> = Box::new(Store::new());
        boxed.write(&path!("a"), Node::from(1)).unwrap();
        assert_eq!(boxed.read(&path!("a")).unwrap(), Some(Node::Int(1)));
    }
}
