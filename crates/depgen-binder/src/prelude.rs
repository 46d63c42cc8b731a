//! Declarations of the framework types every compilation can see.
//!
//! The prelude plays the role of a standard library declaration file: it is
//! parsed once per process and bound into every semantic model under the
//! framework assembly.

use depgen_common::contract::FRAMEWORK_ASSEMBLY;
use depgen_parser::{FileId, SourceFile, parse_source_file};
use once_cell::sync::Lazy;

/// File id reserved for the prelude; never used by host files.
pub const PRELUDE_FILE_ID: FileId = FileId(u32::MAX);

pub const PRELUDE_FILE_NAME: &str = "<prelude>";

pub const PRELUDE_ASSEMBLY: &str = FRAMEWORK_ASSEMBLY;

const PRELUDE_SOURCE: &str = r"
namespace System
{
    public class Object { }
    public sealed class String { }
    public struct Boolean { }
    public struct Byte { }
    public struct SByte { }
    public struct Char { }
    public struct Decimal { }
    public struct Double { }
    public struct Single { }
    public struct Int16 { }
    public struct UInt16 { }
    public struct Int32 { }
    public struct UInt32 { }
    public struct Int64 { }
    public struct UInt64 { }
    public struct Void { }
    public abstract class Attribute { }
    public abstract class Type { }
    public class Exception { }
    public struct Nullable<T> { }
    public class Lazy<T> { }
    public interface IDisposable { }
    public interface IEquatable<T> { }
    public delegate void Action();
    public delegate void Action<T>(T obj);
    public delegate TResult Func<TResult>();
    public delegate TResult Func<T, TResult>(T arg);
}

namespace System.Collections.Generic
{
    public interface IEnumerable<T> { }
    public interface IReadOnlyCollection<T> : IEnumerable<T> { }
    public interface IReadOnlyList<T> : IReadOnlyCollection<T> { }
    public interface ICollection<T> : IEnumerable<T> { }
    public interface IList<T> : ICollection<T> { }
    public interface IReadOnlyDictionary<TKey, TValue> { }
    public interface IDictionary<TKey, TValue> { }
    public class List<T> : IList<T>, IReadOnlyList<T> { }
    public class HashSet<T> : ICollection<T>, IReadOnlyCollection<T> { }
    public class Dictionary<TKey, TValue> : IDictionary<TKey, TValue>, IReadOnlyDictionary<TKey, TValue> { }
}

namespace System.Threading
{
    public struct CancellationToken { }
}

namespace System.Threading.Tasks
{
    public class Task { }
    public class Task<TResult> : Task { }
}

namespace Framework.Allocation
{
    public interface IDependencyInjectionCandidate { }

    public sealed class ResolvedAttribute : System.Attribute { }
    public sealed class CachedAttribute : System.Attribute { }
    public sealed class BackgroundDependencyLoaderAttribute : System.Attribute { }

    public interface IReadOnlyDependencyContainer { }
    public class DependencyContainer : IReadOnlyDependencyContainer { }

    public interface IDependencyActivatorRegistry { }
    public interface ISourceGeneratedDependencyActivator { }
    public static class DependencyActivator { }
}
";

static PRELUDE: Lazy<SourceFile> =
    Lazy::new(|| parse_source_file(PRELUDE_FILE_ID, PRELUDE_FILE_NAME, PRELUDE_SOURCE));

/// The parsed prelude, shared by every model in the process.
#[must_use]
pub fn prelude_file() -> &'static SourceFile {
    &PRELUDE
}
